//! Pure metric formulas shared by the session engine and the leaderboard.

use itertools::{EitherOrBoth, Itertools};
use serde::Serialize;

pub fn elapsed_secs(duration_secs: u32, seconds_remaining: u32) -> u32 {
    duration_secs.saturating_sub(seconds_remaining)
}

/// Correct words extrapolated to a per-minute rate; 0 before any time has passed.
pub fn words_per_minute(correct_words: usize, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let minutes = elapsed_secs as f64 / 60.0;
    (correct_words as f64 / minutes).round() as u32
}

/// Percentage of committed words judged correct; 100 when nothing was committed.
pub fn accuracy(correct_words: usize, incorrect_words: usize) -> u8 {
    let total = correct_words + incorrect_words;
    if total == 0 {
        return 100;
    }
    ((correct_words as f64 / total as f64) * 100.0).round() as u8
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharStatus {
    Correct,
    Incorrect,
    /// typed past the end of the target word
    Extra,
    /// not typed yet
    Pending,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
pub struct CharFeedback {
    pub char: char,
    pub status: CharStatus,
}

/// Character-by-character comparison of the in-progress input against its target.
pub fn input_feedback(target: &str, input: &str) -> Vec<CharFeedback> {
    target
        .chars()
        .zip_longest(input.chars())
        .map(|pair| match pair {
            EitherOrBoth::Both(t, c) if t == c => CharFeedback {
                char: c,
                status: CharStatus::Correct,
            },
            EitherOrBoth::Both(_, c) => CharFeedback {
                char: c,
                status: CharStatus::Incorrect,
            },
            EitherOrBoth::Right(c) => CharFeedback {
                char: c,
                status: CharStatus::Extra,
            },
            EitherOrBoth::Left(t) => CharFeedback {
                char: t,
                status: CharStatus::Pending,
            },
        })
        .collect()
}

/// Result tier shown alongside final metrics
#[derive(Clone, Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum_macros::Display)]
pub enum Rating {
    KeepPracticing,
    Good,
    Great,
    Excellent,
    Legendary,
}

impl Rating {
    pub fn from_metrics(wpm: u32, accuracy: u8) -> Self {
        match (wpm, accuracy) {
            (w, a) if w >= 80 && a >= 95 => Rating::Legendary,
            (w, a) if w >= 60 && a >= 90 => Rating::Excellent,
            (w, a) if w >= 40 && a >= 85 => Rating::Great,
            (w, _) if w >= 20 => Rating::Good,
            _ => Rating::KeepPracticing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Rating::Legendary => "LEGENDARY! You're a typing master!",
            Rating::Excellent => "Excellent work! Keep it up!",
            Rating::Great => "Great job! You're improving!",
            Rating::Good => "Good start! Practice makes perfect!",
            Rating::KeepPracticing => "Keep practicing! You'll get better!",
        }
    }
}
