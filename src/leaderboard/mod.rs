//! Score persistence behind one contract with interchangeable backends.

pub mod file;
pub mod ledger;
pub mod memory;
pub mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 50;
pub const DEFAULT_RETENTION_CAP: usize = 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("score {0} not found")]
    NotFound(u64),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored leaderboard is corrupt: {0}")]
    Corrupt(String),
    #[error("leaderboard lock poisoned")]
    Poisoned,
}

/// Untrusted score as submitted by a client. Every field is optional so that
/// validation can report exactly which one is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub wpm: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub correct_words: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub incorrect_words: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A value of the wrong JSON type reads as absent, leaving `validate` to name the field.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A submission that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub name: String,
    pub wpm: u32,
    pub accuracy: u8,
    pub language: String,
    pub correct_words: u32,
    pub incorrect_words: u32,
    pub timestamp: DateTime<Utc>,
}

impl ScoreSubmission {
    /// Checks name, wpm, accuracy and language in that order, normalizing as it goes.
    pub fn validate(self) -> Result<NewScore, StoreError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(StoreError::Validation {
                field: "name",
                message: "Name is required",
            })?
            .chars()
            .take(MAX_NAME_CHARS)
            .collect::<String>()
            .trim_end()
            .to_string();

        let wpm = self
            .wpm
            .filter(|w| w.is_finite() && (0.0..=u32::MAX as f64).contains(w))
            .ok_or(StoreError::Validation {
                field: "wpm",
                message: "Valid WPM is required",
            })?;

        let accuracy = self
            .accuracy
            .filter(|a| a.is_finite() && (0.0..=100.0).contains(a))
            .ok_or(StoreError::Validation {
                field: "accuracy",
                message: "Valid accuracy (0-100) is required",
            })?;

        let language = self
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or(StoreError::Validation {
                field: "language",
                message: "Language is required",
            })?
            .to_string();

        Ok(NewScore {
            name,
            wpm: wpm.round() as u32,
            accuracy: accuracy.round() as u8,
            language,
            correct_words: self.correct_words.unwrap_or(0),
            incorrect_words: self.incorrect_words.unwrap_or(0),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// A persisted score. Never mutated after the store hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: u64,
    pub name: String,
    pub wpm: u32,
    pub accuracy: u8,
    pub language: String,
    #[serde(default)]
    pub correct_words: u32,
    #[serde(default)]
    pub incorrect_words: u32,
    pub timestamp: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn from_new(id: u64, score: NewScore) -> Self {
        Self {
            id,
            name: score.name,
            wpm: score.wpm,
            accuracy: score.accuracy,
            language: score.language,
            correct_words: score.correct_words,
            incorrect_words: score.incorrect_words,
            timestamp: score.timestamp,
        }
    }
}

/// Leaderboard order: wpm desc, accuracy desc, then insertion order.
pub fn rank_order(a: &ScoreRecord, b: &ScoreRecord) -> Ordering {
    b.wpm
        .cmp(&a.wpm)
        .then_with(|| b.accuracy.cmp(&a.accuracy))
        .then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStats {
    #[serde(rename = "totalScores")]
    pub total_scores: usize,
    #[serde(rename = "totalPlayers")]
    pub total_players: usize,
    #[serde(rename = "topWPM")]
    pub top_wpm: u32,
    #[serde(rename = "averageWPM")]
    pub average_wpm: u32,
    #[serde(rename = "averageAccuracy")]
    pub average_accuracy: u32,
}

/// Key-ordered score persistence. Implementations serialize concurrent callers
/// themselves and never retry a failed operation.
pub trait LeaderboardStore: Send + Sync + fmt::Debug {
    fn append(&self, submission: ScoreSubmission) -> Result<ScoreRecord, StoreError>;

    /// At most `n` records for `language`, best first. Unknown languages yield nothing.
    fn top_n(&self, language: &str, n: usize) -> Result<Vec<ScoreRecord>, StoreError>;

    fn top_n_all(&self, n: usize) -> Result<Vec<ScoreRecord>, StoreError>;

    fn stats(&self, language: Option<&str>) -> Result<LeaderboardStats, StoreError>;

    fn remove(&self, id: u64) -> Result<ScoreRecord, StoreError>;

    fn backend(&self) -> BackendKind;
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub backend: BackendKind,
    /// Location of the file or database; the platform state dir when unset
    pub path: Option<PathBuf>,
    pub retention_cap: Option<usize>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            path: None,
            retention_cap: Some(DEFAULT_RETENTION_CAP),
        }
    }
}

impl StoreOptions {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| match self.backend {
            BackendKind::File => crate::app_dirs::AppDirs::leaderboard_json_path(),
            _ => crate::app_dirs::AppDirs::leaderboard_db_path(),
        })
    }
}

pub fn open_store(options: &StoreOptions) -> Result<Arc<dyn LeaderboardStore>, StoreError> {
    let store: Arc<dyn LeaderboardStore> = match options.backend {
        BackendKind::Memory => Arc::new(MemoryStore::new(options.retention_cap)),
        BackendKind::File => {
            let store = FileStore::open(options.resolved_path(), options.retention_cap)?;
            tracing::debug!(path = %store.path().display(), "using leaderboard file");
            Arc::new(store)
        }
        BackendKind::Sqlite => Arc::new(SqliteStore::open(
            options.resolved_path(),
            options.retention_cap,
        )?),
    };
    tracing::info!(backend = %options.backend, "leaderboard store opened");
    Ok(store)
}
