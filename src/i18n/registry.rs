//! Supported languages and `Accept-Language` negotiation.

use std::sync::OnceLock;

/// A language visitors can pick, with its display names
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// ISO 639-1 code, also the key of the string table
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    /// Strings are authored in this language; missing choices fall back to it
    pub is_canonical: bool,
    pub enabled: bool,
}

/// Supported languages, built once on first use
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn list_enabled(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().filter(|lang| lang.enabled).collect()
    }

    /// The language strings are authored in; the first entry if none is marked
    pub fn canonical(&self) -> &LanguageConfig {
        self.languages
            .iter()
            .find(|lang| lang.is_canonical)
            .unwrap_or(&self.languages[0])
    }

    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code).is_some_and(|lang| lang.enabled)
    }

    /// Pick the best enabled language for an `Accept-Language` header value.
    ///
    /// Tags are ranked by their `q` weight (default 1.0, ties keep header order)
    /// and matched on the primary subtag, so `es-MX` selects `es`.
    pub fn negotiate(&self, header: &str) -> Option<&LanguageConfig> {
        let mut candidates: Vec<(f32, usize, String)> = header
            .split(',')
            .enumerate()
            .filter_map(|(position, part)| {
                let mut pieces = part.trim().split(';');
                let tag = pieces.next()?.trim();
                if tag.is_empty() || tag == "*" {
                    return None;
                }
                let weight = pieces
                    .filter_map(|p| p.trim().strip_prefix("q="))
                    .find_map(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                let primary = tag.split('-').next()?.to_ascii_lowercase();
                Some((weight, position, primary))
            })
            .filter(|(weight, _, _)| *weight > 0.0)
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        candidates
            .iter()
            .find_map(|(_, _, code)| self.get_by_code(code).filter(|lang| lang.enabled))
    }
}

fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            code: "en",
            name: "English",
            native_name: "English",
            is_canonical: true,
            enabled: true,
        },
        LanguageConfig {
            code: "es",
            name: "Spanish",
            native_name: "Español",
            is_canonical: false,
            enabled: true,
        },
    ]
}
