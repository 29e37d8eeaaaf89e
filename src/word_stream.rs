use crate::language::Language;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Sizing of the materialized stream and when it grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordStreamConfig {
    pub initial_size: usize,
    /// Refill once fewer than this many words remain ahead of the cursor.
    pub refill_margin: usize,
    pub refill_batch: usize,
}

impl Default for WordStreamConfig {
    fn default() -> Self {
        Self {
            initial_size: 200,
            refill_margin: 50,
            refill_batch: 100,
        }
    }
}

/// Strategy for drawing target words out of a pool
pub trait WordSampler: Send + fmt::Debug {
    fn sample(&mut self, pool: &Language, count: usize) -> Vec<String>;
}

/// Uniform sampling with replacement
#[derive(Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl WordSampler for RandomSampler {
    fn sample(&mut self, pool: &Language, count: usize) -> Vec<String> {
        pool.sample(&mut self.rng, count)
    }
}

/// The conceptually infinite sequence of words a session is typed against.
#[derive(Debug)]
pub struct WordStream {
    pool: Arc<Language>,
    words: Vec<String>,
    config: WordStreamConfig,
    sampler: Box<dyn WordSampler>,
}

impl WordStream {
    pub fn new(pool: Arc<Language>, config: WordStreamConfig, sampler: Box<dyn WordSampler>) -> Self {
        let mut stream = Self {
            pool,
            words: Vec::new(),
            config,
            sampler,
        };
        stream.resample();
        stream
    }

    /// Starts from a known prefix; later refills and resamples come from the pool.
    pub fn with_prefix(
        pool: Arc<Language>,
        prefix: Vec<String>,
        config: WordStreamConfig,
        sampler: Box<dyn WordSampler>,
    ) -> Self {
        Self {
            pool,
            words: prefix,
            config,
            sampler,
        }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.words.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn language(&self) -> &str {
        &self.pool.name
    }

    pub fn config(&self) -> &WordStreamConfig {
        &self.config
    }

    /// Up to `count` words starting at `start`.
    pub fn window(&self, start: usize, count: usize) -> &[String] {
        let start = start.min(self.words.len());
        let end = start.saturating_add(count).min(self.words.len());
        &self.words[start..end]
    }

    /// Grow the stream until at least `refill_margin` words sit ahead of `cursor`.
    /// Returns the number of words appended.
    pub fn ensure_ahead(&mut self, cursor: usize) -> usize {
        let before = self.words.len();
        let batch = self.config.refill_batch.max(1);
        while self.words.len().saturating_sub(cursor) < self.config.refill_margin.max(1) {
            let more = self.sampler.sample(&self.pool, batch);
            if more.is_empty() {
                break;
            }
            self.words.extend(more);
        }
        self.words.len() - before
    }

    /// Replace the whole stream with a fresh sample from the pool.
    pub fn resample(&mut self) {
        self.words = self.sampler.sample(&self.pool, self.config.initial_size);
    }
}
