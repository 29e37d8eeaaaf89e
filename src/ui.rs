use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::leaderboard::ScoreRecord;
use crate::scoring::CharStatus;
use crate::session::{Phase, SessionEngine};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

/// Greedy word wrap by display width. Returns the index ranges of each line.
pub fn wrap_words<S: AsRef<str>>(words: &[S], max_width: usize) -> Vec<std::ops::Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, word) in words.iter().enumerate() {
        let w = word.as_ref().width();
        let needed = if used == 0 { w } else { used + 1 + w };
        if used > 0 && needed > max_width {
            lines.push(start..i);
            start = i;
            used = w;
        } else {
            used = needed;
        }
    }
    if start < words.len() {
        lines.push(start..words.len());
    }
    lines
}

/// Left-align `s` in a column `width` cells wide, truncating on overflow.
pub fn pad(s: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

/// Plain-text leaderboard table for the terminal.
pub fn leaderboard_table(scores: &[ScoreRecord]) -> String {
    const NAME: usize = 20;
    const LANG: usize = 12;

    let mut out = format!(
        "{:>4}  {}  {:>4}  {:>4}  {}  {}\n",
        "#",
        pad("name", NAME),
        "wpm",
        "acc",
        pad("language", LANG),
        "date"
    );
    for (rank, score) in scores.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {}  {:>4}  {:>3}%  {}  {}\n",
            rank + 1,
            pad(&score.name, NAME),
            score.wpm,
            score.accuracy,
            pad(&score.language, LANG),
            score.timestamp.format("%Y-%m-%d")
        ));
    }
    out
}

fn status_color(status: CharStatus) -> Color {
    match status {
        CharStatus::Correct => Color::Green,
        CharStatus::Incorrect => Color::Red,
        CharStatus::Extra => Color::DarkRed,
        CharStatus::Pending => Color::Reset,
    }
}

/// Redraw the whole practice screen for the current engine state.
pub fn draw<W: Write>(out: &mut W, engine: &SessionEngine, size: (u16, u16)) -> io::Result<()> {
    let (cols, _) = size;
    let max_width = cols.saturating_sub(HORIZONTAL_MARGIN * 2).max(10) as usize;
    let metrics = engine.metrics();

    queue!(out, Clear(ClearType::All), MoveTo(HORIZONTAL_MARGIN, VERTICAL_MARGIN))?;
    queue!(
        out,
        SetForegroundColor(Color::Magenta),
        Print(format!(
            "{}  {}s  {} wpm  {}% acc",
            engine.language(),
            metrics.seconds_remaining,
            metrics.wpm,
            metrics.accuracy
        )),
        SetForegroundColor(Color::Reset)
    )?;

    if engine.phase() == Phase::Finished {
        let row = VERTICAL_MARGIN + 2;
        queue!(
            out,
            MoveTo(HORIZONTAL_MARGIN, row),
            SetAttribute(Attribute::Bold),
            Print(format!(
                "{} wpm  {}% accuracy  {} correct  {} incorrect",
                metrics.wpm, metrics.accuracy, metrics.correct_words, metrics.incorrect_words
            )),
            SetAttribute(Attribute::Reset)
        )?;
        if let Some(rating) = engine.rating() {
            queue!(out, MoveTo(HORIZONTAL_MARGIN, row + 1), Print(rating.message()))?;
        }
        queue!(
            out,
            MoveTo(HORIZONTAL_MARGIN, row + 3),
            SetAttribute(Attribute::Italic),
            Print("(tab) retry  (esc) quit"),
            SetAttribute(Attribute::Reset)
        )?;
        return out.flush();
    }

    let words = engine.visible_words();
    let mut row = VERTICAL_MARGIN + 2;
    for line in wrap_words(words, max_width) {
        queue!(out, MoveTo(HORIZONTAL_MARGIN, row))?;
        for idx in line {
            if idx == 0 {
                queue!(out, SetAttribute(Attribute::Underlined))?;
                for fb in engine.input_feedback() {
                    queue!(out, SetForegroundColor(status_color(fb.status)), Print(fb.char))?;
                }
                queue!(out, SetForegroundColor(Color::Reset), SetAttribute(Attribute::Reset))?;
            } else {
                queue!(
                    out,
                    SetAttribute(Attribute::Dim),
                    Print(&words[idx]),
                    SetAttribute(Attribute::Reset)
                )?;
            }
            queue!(out, Print(' '))?;
        }
        row += 1;
    }

    if engine.phase() == Phase::Idle {
        queue!(
            out,
            MoveTo(HORIZONTAL_MARGIN, row + 1),
            SetAttribute(Attribute::Italic),
            Print("start typing to begin  (esc) quit"),
            SetAttribute(Attribute::Reset)
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::session::SessionConfig;
    use std::sync::Arc;

    #[test]
    fn wrap_respects_width() {
        let words = ["aaa", "bb", "cccc", "d"];
        let lines = wrap_words(&words, 7);
        assert_eq!(lines, vec![0..2, 2..4]);
    }

    #[test]
    fn wrap_keeps_overlong_word_on_its_own_line() {
        let words = ["a", "abcdefghij", "b"];
        let lines = wrap_words(&words, 5);
        assert_eq!(lines, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn wrap_counts_wide_glyphs() {
        // each hiragana is two cells wide
        let words = ["あい", "う"];
        assert_eq!(wrap_words(&words, 6), vec![0..1, 1..2]);
        assert_eq!(wrap_words(&words, 7), vec![0..2]);
    }

    #[test]
    fn pad_truncates_and_fills() {
        assert_eq!(pad("abc", 5), "abc  ");
        assert_eq!(pad("abcdef", 3), "abc");
        assert_eq!(pad("あいう", 5), "あい ");
    }

    #[test]
    fn table_has_header_and_ranks() {
        let score = ScoreRecord {
            id: 1,
            name: "ana".into(),
            wpm: 72,
            accuracy: 97,
            language: "english".into(),
            correct_words: 72,
            incorrect_words: 2,
            timestamp: chrono::Utc::now(),
        };
        let table = leaderboard_table(&[score]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("wpm"));
        assert!(lines[1].trim_start().starts_with("1  ana"));
        assert!(lines[1].contains("97%"));
    }

    #[test]
    fn draw_idle_screen() {
        let pool = Arc::new(Language::from_words("english", vec!["hello".into()]));
        let engine = SessionEngine::new(pool, SessionConfig::default());
        let mut buf = Vec::new();
        draw(&mut buf, &engine, (80, 24)).unwrap();
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("english"));
        assert!(text.contains("start typing"));
    }
}
