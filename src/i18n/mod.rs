//! Localized strings for flash messages, validation errors and labels.
//!
//! The same tables are served to the front end at `/translations/{code}`.
//! A visitor's language comes from their profile, else `Accept-Language`,
//! else the configured default.

mod language;
mod registry;
mod strings;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
pub use strings::{fill, LanguageStrings, ENGLISH_STRINGS, SPANISH_STRINGS};
