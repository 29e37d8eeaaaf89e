use super::{
    BackendKind, LeaderboardStats, LeaderboardStore, ScoreRecord, ScoreSubmission, StoreError,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS leaderboard (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    wpm INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    language TEXT NOT NULL,
    correct_words INTEGER NOT NULL DEFAULT 0,
    incorrect_words INTEGER NOT NULL DEFAULT 0,
    timestamp TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_leaderboard_rank ON leaderboard(language, wpm DESC, accuracy DESC);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, name, wpm, accuracy, language, correct_words, incorrect_words, timestamp FROM leaderboard";

/// Leaderboard backed by a SQLite table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    retention_cap: Option<usize>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, retention_cap: Option<usize>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?, retention_cap)
    }

    pub fn open_in_memory(retention_cap: Option<usize>) -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, retention_cap)
    }

    fn init(conn: Connection, retention_cap: Option<usize>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            retention_cap,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn sql_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
    let timestamp_str: String = row.get(7)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                7,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })?
        .with_timezone(&Utc);

    Ok(ScoreRecord {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        wpm: row.get(2)?,
        accuracy: row.get(3)?,
        language: row.get(4)?,
        correct_words: row.get(5)?,
        incorrect_words: row.get(6)?,
        timestamp,
    })
}

impl LeaderboardStore for SqliteStore {
    fn append(&self, submission: ScoreSubmission) -> Result<ScoreRecord, StoreError> {
        let score = submission.validate()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO leaderboard
            (name, wpm, accuracy, language, correct_words, incorrect_words, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                score.name,
                score.wpm,
                score.accuracy,
                score.language,
                score.correct_words,
                score.incorrect_words,
                score.timestamp.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid() as u64;

        let evicted = match self.retention_cap {
            Some(cap) => tx.execute(
                r#"
                DELETE FROM leaderboard
                WHERE language = ?1 AND id NOT IN (
                    SELECT id FROM leaderboard
                    WHERE language = ?1
                    ORDER BY wpm DESC, accuracy DESC, id ASC
                    LIMIT ?2
                )
                "#,
                params![score.language, sql_limit(cap)],
            )?,
            None => 0,
        };
        tx.commit()?;

        if evicted > 0 {
            tracing::debug!(evicted, language = %score.language, "pruned leaderboard");
        }
        Ok(ScoreRecord::from_new(id, score))
    }

    fn top_n(&self, language: &str, n: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE language = ?1 ORDER BY wpm DESC, accuracy DESC, id ASC LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![language, sql_limit(n)], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn top_n_all(&self, n: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY wpm DESC, accuracy DESC, id ASC LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![sql_limit(n)], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn stats(&self, language: Option<&str>) -> Result<LeaderboardStats, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                COUNT(*),
                COUNT(DISTINCT name),
                COALESCE(MAX(wpm), 0),
                AVG(wpm),
                AVG(accuracy)
            FROM leaderboard
            WHERE ?1 IS NULL OR language = ?1
            "#,
        )?;

        let stats = stmt.query_row(params![language], |row| {
            let avg_wpm: Option<f64> = row.get(3)?;
            let avg_accuracy: Option<f64> = row.get(4)?;
            Ok(LeaderboardStats {
                total_scores: row.get::<_, i64>(0)? as usize,
                total_players: row.get::<_, i64>(1)? as usize,
                top_wpm: row.get(2)?,
                average_wpm: avg_wpm.map_or(0, |m| m.round() as u32),
                average_accuracy: avg_accuracy.map_or(0, |m| m.round() as u32),
            })
        })?;
        Ok(stats)
    }

    fn remove(&self, id: u64) -> Result<ScoreRecord, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let existing = tx
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id as i64],
                record_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(id))?;
        tx.execute("DELETE FROM leaderboard WHERE id = ?1", params![id as i64])?;
        tx.commit()?;
        Ok(existing)
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }
}
