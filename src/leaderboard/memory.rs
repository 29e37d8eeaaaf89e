use super::ledger::Ledger;
use super::{
    BackendKind, LeaderboardStats, LeaderboardStore, ScoreRecord, ScoreSubmission, StoreError,
};
use std::sync::{Mutex, MutexGuard};

/// Process-lifetime leaderboard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
    retention_cap: Option<usize>,
}

impl MemoryStore {
    pub fn new(retention_cap: Option<usize>) -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            retention_cap,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, StoreError> {
        self.ledger.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LeaderboardStore for MemoryStore {
    fn append(&self, submission: ScoreSubmission) -> Result<ScoreRecord, StoreError> {
        let score = submission.validate()?;
        let (record, evicted) = self.lock()?.insert(score, self.retention_cap);
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
        self.lock()?.remove(id)
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }
}
