use super::{rank_order, LeaderboardStats, NewScore, ScoreRecord, StoreError};
use crate::scoring::mean;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Score collection shared by the memory and file backends.
/// Serializes to the `{scores, lastId}` document the file backend persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub scores: Vec<ScoreRecord>,
    pub last_id: u64,
}

impl Ledger {
    /// Store `score` and prune its language down to `cap`. Returns the new
    /// record and how many records the cap evicted.
    pub fn insert(&mut self, score: NewScore, cap: Option<usize>) -> (ScoreRecord, usize) {
        self.last_id += 1;
        let record = ScoreRecord::from_new(self.last_id, score);
        self.scores.push(record.clone());
        let evicted = cap.map_or(0, |cap| self.prune(&record.language, cap));
        (record, evicted)
    }

    fn prune(&mut self, language: &str, cap: usize) -> usize {
        let ranked: Vec<&ScoreRecord> = self
            .scores
            .iter()
            .filter(|s| s.language == language)
            .sorted_by(|a, b| rank_order(a, b))
            .collect();
        if ranked.len() <= cap {
            return 0;
        }
        let evict: HashSet<u64> = ranked[cap..].iter().map(|s| s.id).collect();
        let before = self.scores.len();
        self.scores.retain(|s| !evict.contains(&s.id));
        before - self.scores.len()
    }

    pub fn top_n(&self, language: Option<&str>, n: usize) -> Vec<ScoreRecord> {
        self.matching(language)
            .sorted_by(|a, b| rank_order(a, b))
            .take(n)
            .cloned()
            .collect()
    }

    pub fn stats(&self, language: Option<&str>) -> LeaderboardStats {
        let scores: Vec<&ScoreRecord> = self.matching(language).collect();
        if scores.is_empty() {
            return LeaderboardStats::default();
        }
        let wpms: Vec<f64> = scores.iter().map(|s| s.wpm as f64).collect();
        let accuracies: Vec<f64> = scores.iter().map(|s| s.accuracy as f64).collect();

        LeaderboardStats {
            total_scores: scores.len(),
            total_players: scores.iter().map(|s| s.name.as_str()).unique().count(),
            top_wpm: scores.iter().map(|s| s.wpm).max().unwrap_or(0),
            average_wpm: mean(&wpms).map_or(0, |m| m.round() as u32),
            average_accuracy: mean(&accuracies).map_or(0, |m| m.round() as u32),
        }
    }

    pub fn remove(&mut self, id: u64) -> Result<ScoreRecord, StoreError> {
        let idx = self
            .scores
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::NotFound(id))?;
        Ok(self.scores.remove(idx))
    }

    fn matching<'a>(&'a self, language: Option<&'a str>) -> impl Iterator<Item = &'a ScoreRecord> + 'a {
        self.scores
            .iter()
            .filter(move |s| language.map_or(true, |l| s.language == l))
    }
}
