use crate::language::Language;
use crate::leaderboard::ScoreSubmission;
use crate::scoring::{self, CharFeedback, Rating};
use crate::word_stream::{RandomSampler, WordStream, WordStreamConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub duration_secs: u32,
    pub stream: WordStreamConfig,
    /// How many words from the cursor onward a caller should display
    pub visible_words: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            stream: WordStreamConfig::default(),
            visible_words: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Outcome recorded for a committed word
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Judgement {
    pub submitted: String,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub cursor: usize,
    pub current_input: String,
    pub judgements: BTreeMap<usize, Judgement>,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub seconds_remaining: u32,
    pub phase: Phase,
    pub wpm: u32,
    pub accuracy: u8,
}

impl SessionState {
    fn initial(duration_secs: u32) -> Self {
        Self {
            cursor: 0,
            current_input: String::new(),
            judgements: BTreeMap::new(),
            correct_count: 0,
            incorrect_count: 0,
            seconds_remaining: duration_secs,
            phase: Phase::Idle,
            wpm: 0,
            accuracy: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub wpm: u32,
    pub accuracy: u8,
    pub correct_words: usize,
    pub incorrect_words: usize,
    pub elapsed_secs: u32,
    pub seconds_remaining: u32,
}

/// A single typing test: word stream, per-word judgement and countdown.
///
/// The engine does no I/O and never fails. Operations that make no sense in
/// the current phase are ignored.
#[derive(Debug)]
pub struct SessionEngine {
    config: SessionConfig,
    stream: WordStream,
    state: SessionState,
    epoch: u64,
}

impl SessionEngine {
    pub fn new(pool: Arc<Language>, config: SessionConfig) -> Self {
        let stream = WordStream::new(pool, config.stream, Box::new(RandomSampler::new()));
        Self::with_stream(stream, config)
    }

    pub fn with_stream(stream: WordStream, config: SessionConfig) -> Self {
        Self {
            config,
            stream,
            state: SessionState::initial(config.duration_secs),
            epoch: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn has_started(&self) -> bool {
        self.state.phase != Phase::Idle
    }

    pub fn has_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    /// Incremented by every reset; ticks scheduled for an older epoch are stale.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn language(&self) -> &str {
        self.stream.language()
    }

    pub fn stream(&self) -> &WordStream {
        &self.stream
    }

    pub fn current_word(&self) -> Option<&str> {
        self.stream.get(self.state.cursor)
    }

    pub fn visible_words(&self) -> &[String] {
        self.stream.window(self.state.cursor, self.config.visible_words)
    }

    pub fn input_feedback(&self) -> Vec<CharFeedback> {
        scoring::input_feedback(self.current_word().unwrap_or(""), &self.state.current_input)
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            wpm: self.state.wpm,
            accuracy: self.state.accuracy,
            correct_words: self.state.correct_count,
            incorrect_words: self.state.incorrect_count,
            elapsed_secs: self.elapsed_secs(),
            seconds_remaining: self.state.seconds_remaining,
        }
    }

    pub fn rating(&self) -> Option<Rating> {
        self.has_finished()
            .then(|| Rating::from_metrics(self.state.wpm, self.state.accuracy))
    }

    /// Replace the in-progress word. Whitespace is the commit trigger and never
    /// part of the word, so it is stripped.
    pub fn update_input(&mut self, text: &str) {
        if self.has_finished() {
            return;
        }
        let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if self.state.phase == Phase::Idle {
            if cleaned.is_empty() {
                return;
            }
            self.start();
        }
        self.state.current_input = cleaned;
    }

    /// Judge the current input against the word under the cursor and advance.
    pub fn commit_word(&mut self) -> Option<&Judgement> {
        if self.state.phase != Phase::Running || self.state.current_input.is_empty() {
            return None;
        }

        let submitted = self.state.current_input.trim().to_string();
        let correct = self.current_word() == Some(submitted.as_str());
        let idx = self.state.cursor;

        if correct {
            self.state.correct_count += 1;
        } else {
            self.state.incorrect_count += 1;
        }
        self.state
            .judgements
            .insert(idx, Judgement { submitted, correct });
        self.state.cursor += 1;
        self.state.current_input.clear();

        self.stream.ensure_ahead(self.state.cursor);
        self.refresh_metrics();

        self.state.judgements.get(&idx)
    }

    /// One second of countdown. Returns the phase after the tick.
    pub fn tick(&mut self) -> Phase {
        if self.state.phase != Phase::Running {
            return self.state.phase;
        }
        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(1);
        self.refresh_metrics();
        if self.state.seconds_remaining == 0 {
            self.state.phase = Phase::Finished;
        }
        self.state.phase
    }

    /// Tick on behalf of a timer armed during `epoch`; stale timers are ignored.
    pub fn tick_epoch(&mut self, epoch: u64) -> Phase {
        if epoch != self.epoch {
            return self.state.phase;
        }
        self.tick()
    }

    /// End a running test early, freezing the metrics as they stand.
    pub fn finish(&mut self) {
        if self.state.phase == Phase::Running {
            self.refresh_metrics();
            self.state.phase = Phase::Finished;
        }
    }

    pub fn reset(&mut self) {
        self.stream.resample();
        self.state = SessionState::initial(self.config.duration_secs);
        self.epoch += 1;
    }

    /// Leaderboard submission for a finished test.
    pub fn submission(&self, name: &str) -> Option<ScoreSubmission> {
        if !self.has_finished() {
            return None;
        }
        Some(ScoreSubmission {
            name: Some(name.to_string()),
            wpm: Some(self.state.wpm as f64),
            accuracy: Some(self.state.accuracy as f64),
            language: Some(self.language().to_string()),
            correct_words: Some(self.state.correct_count as u32),
            incorrect_words: Some(self.state.incorrect_count as u32),
            timestamp: None,
        })
    }

    fn start(&mut self) {
        self.state.phase = Phase::Running;
        self.stream.ensure_ahead(self.state.cursor);
    }

    fn elapsed_secs(&self) -> u32 {
        scoring::elapsed_secs(self.config.duration_secs, self.state.seconds_remaining)
    }

    fn refresh_metrics(&mut self) {
        self.state.wpm = scoring::words_per_minute(self.state.correct_count, self.elapsed_secs());
        self.state.accuracy = scoring::accuracy(self.state.correct_count, self.state.incorrect_count);
    }
}
