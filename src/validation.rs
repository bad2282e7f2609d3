//! Form validation producing a field → message mapping.
//!
//! Messages come from the caller's [`LanguageStrings`] so the front end can
//! show them verbatim beneath each input.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::error::AppError;
use crate::i18n::{fill, LanguageStrings};

/// Field name → first error message for that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Record an error unless the field already has one
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_message(&self) -> Option<&str> {
        self.0.values().next().map(String::as_str)
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Shape check for an email address (one `@`, a dot in the domain, no spaces)
pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Absolute http(s) URL with a host
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

/// Accumulating validator; each rule is skipped once its field already failed.
pub struct Validator<'a> {
    strings: &'a LanguageStrings,
    errors: ValidationErrors,
}

impl<'a> Validator<'a> {
    pub fn new(strings: &'a LanguageStrings) -> Self {
        Self {
            strings,
            errors: ValidationErrors::default(),
        }
    }

    fn field_label(field: &str) -> String {
        field.replace('_', " ")
    }

    fn fail(&mut self, field: &str, template: &str, extra: &[(&str, String)]) {
        let mut params = vec![("field", Self::field_label(field))];
        params.extend(extra.iter().cloned());
        let message = fill(template, &params);
        self.errors.add(field, message);
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if !self.errors.has(field) && value.trim().is_empty() {
            self.fail(field, self.strings.field_required, &[]);
        }
        self
    }

    /// Email format; empty values are left to `required`
    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !self.errors.has(field) && !value.is_empty() && !is_valid_email(value) {
            self.fail(field, self.strings.field_email, &[]);
        }
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if !self.errors.has(field) && value.chars().count() < min {
            self.fail(field, self.strings.field_min, &[("min", min.to_string())]);
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if !self.errors.has(field) && value.chars().count() > max {
            self.fail(field, self.strings.field_max, &[("max", max.to_string())]);
        }
        self
    }

    /// `value` must equal its `{field}_confirmation` companion
    pub fn confirmed(&mut self, field: &str, value: &str, confirmation: &str) -> &mut Self {
        if !self.errors.has(field) && value != confirmation {
            self.fail(field, self.strings.field_confirmed, &[]);
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !self.errors.has(field) && !allowed.contains(&value) {
            self.fail(field, self.strings.field_in, &[]);
        }
        self
    }

    pub fn range_i64(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if !self.errors.has(field) && !(min..=max).contains(&value) {
            self.fail(
                field,
                self.strings.field_between,
                &[("min", min.to_string()), ("max", max.to_string())],
            );
        }
        self
    }

    /// Optional URL: empty passes
    pub fn url(&mut self, field: &str, value: &str) -> &mut Self {
        if !self.errors.has(field) && !value.is_empty() && !is_valid_url(value) {
            self.fail(field, self.strings.field_url, &[]);
        }
        self
    }

    /// Flag `field` as already in use
    pub fn unique_violation(&mut self, field: &str) -> &mut Self {
        if !self.errors.has(field) {
            self.fail(field, self.strings.field_unique, &[]);
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.add(field, message);
        self
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has(field)
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}
