pub mod catalog;
pub mod core;

pub use catalog::WordCatalog;
pub use core::{Language, LanguageError};

use clap::ValueEnum;

/// Languages shipped with the binary, selectable from the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupportedLanguage {
    English,
    Indonesian,
    Spanish,
    French,
    German,
    Portuguese,
    Japanese,
}

impl SupportedLanguage {
    pub fn as_lang(&self) -> Result<Language, LanguageError> {
        Language::load(&self.to_string())
    }
}
