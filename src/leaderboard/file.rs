use super::ledger::Ledger;
use super::{
    BackendKind, LeaderboardStats, LeaderboardStore, ScoreRecord, ScoreSubmission, StoreError,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Leaderboard kept as a single JSON document on disk.
///
/// The whole document is rewritten on every mutation through a sibling temp
/// file and a rename, so a crash mid-write leaves the previous version intact.
/// The in-memory copy only changes once the write has succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    ledger: Mutex<Ledger>,
    retention_cap: Option<usize>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P, retention_cap: Option<usize>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let ledger = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?
        } else {
            let ledger = Ledger::default();
            write_ledger(&path, &ledger)?;
            tracing::info!(path = %path.display(), "initialized leaderboard file");
            ledger
        };

        Ok(Self {
            path,
            ledger: Mutex::new(ledger),
            retention_cap,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, StoreError> {
        self.ledger.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn write_ledger(path: &Path, ledger: &Ledger) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(ledger)
        .map_err(|e| StoreError::Corrupt(format!("cannot encode leaderboard: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl LeaderboardStore for FileStore {
    fn append(&self, submission: ScoreSubmission) -> Result<ScoreRecord, StoreError> {
        let score = submission.validate()?;
        let mut ledger = self.lock()?;

        let mut next = ledger.clone();
        let (record, evicted) = next.insert(score, self.retention_cap);
        write_ledger(&self.path, &next)?;
        *ledger = next;

        if evicted > 0 {
            tracing::debug!(evicted, language = %record.language, "pruned leaderboard");
        }
        Ok(record)
    }

    fn top_n(&self, language: &str, n: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        Ok(self.lock()?.top_n(Some(language), n))
    }

    fn top_n_all(&self, n: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        Ok(self.lock()?.top_n(None, n))
    }

    fn stats(&self, language: Option<&str>) -> Result<LeaderboardStats, StoreError> {
        Ok(self.lock()?.stats(language))
    }

    fn remove(&self, id: u64) -> Result<ScoreRecord, StoreError> {
        let mut ledger = self.lock()?;
        let mut next = ledger.clone();
        let removed = next.remove(id)?;
        write_ledger(&self.path, &next)?;
        *ledger = next;
        Ok(removed)
    }

    fn backend(&self) -> BackendKind {
        BackendKind::File
    }
}
