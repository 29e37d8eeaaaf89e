use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;
use thiserror::Error;

static LANG_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("language not found: {0}")]
    NotFound(String),
    #[error("language file {name} is not valid: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A bundled vocabulary the word stream samples from.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Language {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Language {
    pub fn load(name: &str) -> Result<Self, LanguageError> {
        read_language_from_file(&format!("{name}.json"), name)
    }

    /// Build a pool from an explicit word list, bypassing the bundled files.
    pub fn from_words(name: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            name: name.into(),
            size: words.len() as u32,
            words,
        }
    }

    /// Identifiers of every bundled language, sorted.
    pub fn available() -> Vec<String> {
        let mut names: Vec<String> = LANG_DIR
            .files()
            .filter_map(|f| {
                let path = f.path();
                match path.extension().and_then(|e| e.to_str()) {
                    Some("json") => path.file_stem()?.to_str().map(str::to_string),
                    _ => None,
                }
            })
            .collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Uniform sampling with replacement.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, num: usize) -> Vec<String> {
        if self.words.is_empty() {
            return Vec::new();
        }
        (0..num)
            .filter_map(|_| self.words.choose(rng).cloned())
            .collect()
    }

    /// Shuffled sampling without replacement, capped at the pool size.
    pub fn shuffled<R: Rng + ?Sized>(&self, rng: &mut R, num: usize) -> Vec<String> {
        self.words.choose_multiple(rng, num).cloned().collect()
    }
}

fn read_language_from_file(file_name: &str, name: &str) -> Result<Language, LanguageError> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| LanguageError::NotFound(name.to_string()))?;

    let file_as_str = file
        .contents_utf8()
        .ok_or_else(|| LanguageError::NotFound(name.to_string()))?;

    from_str(file_as_str).map_err(|source| LanguageError::Malformed {
        name: name.to_string(),
        source,
    })
}
