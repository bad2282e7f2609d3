//! A language code checked against the registry.

use crate::i18n::strings::{LanguageStrings, ENGLISH_STRINGS, SPANISH_STRINGS};
use crate::i18n::LanguageRegistry;
use anyhow::{bail, Result};

/// A language that has been validated against the registry.
///
/// Only supported, enabled languages can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "es")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };
    pub const SPANISH: Language = Language { code: "es" };

    /// Only enabled languages are accepted
    pub fn from_code(code: &str) -> Result<Language> {
        let registry = LanguageRegistry::get();

        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Language { code: config.code }),
            Some(_) => bail!("Language '{}' is not enabled", code),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Resolve an `Accept-Language` header, falling back to `default` and
    /// finally to the canonical language.
    pub fn negotiate(header: Option<&str>, default: &str) -> Language {
        header
            .and_then(|value| LanguageRegistry::get().negotiate(value))
            .map(|config| Language { code: config.code })
            .or_else(|| Language::from_code(default).ok())
            .unwrap_or_else(Language::canonical)
    }

    /// The language strings are authored in.
    pub fn canonical() -> Language {
        let config = LanguageRegistry::get().canonical();
        Language { code: config.code }
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Localized string table for this language.
    pub fn strings(&self) -> &'static LanguageStrings {
        match self.code {
            "es" => &SPANISH_STRINGS,
            _ => &ENGLISH_STRINGS,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::canonical()
    }
}
