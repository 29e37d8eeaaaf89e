use super::core::{Language, LanguageError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Every bundled language, loaded once and shared between requests.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    languages: Arc<BTreeMap<String, Language>>,
}

impl WordCatalog {
    pub fn bundled() -> Result<Self, LanguageError> {
        let languages = Language::available()
            .into_iter()
            .map(|name| Language::load(&name).map(|lang| (name, lang)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self {
            languages: Arc::new(languages),
        })
    }

    pub fn from_languages(languages: impl IntoIterator<Item = Language>) -> Self {
        Self {
            languages: Arc::new(
                languages
                    .into_iter()
                    .map(|lang| (lang.name.clone(), lang))
                    .collect(),
            ),
        }
    }

    /// Unknown and empty pools are both reported as missing.
    pub fn get(&self, name: &str) -> Result<&Language, LanguageError> {
        self.languages
            .get(name)
            .filter(|lang| !lang.is_empty())
            .ok_or_else(|| LanguageError::NotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.languages.values()
    }
}
