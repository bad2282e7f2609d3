//! Password strength scoring shared by the register, reset and change-password forms.

use serde::Serialize;

use crate::i18n::LanguageStrings;

/// Minimum length both the scorer and server-side validation insist on
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// The five independent checks that make up the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthChecks {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digit: bool,
    pub symbol: bool,
}

impl StrengthChecks {
    pub fn evaluate(password: &str) -> Self {
        Self {
            length: password.chars().count() >= MIN_PASSWORD_LENGTH,
            uppercase: password.chars().any(char::is_uppercase),
            lowercase: password.chars().any(char::is_lowercase),
            digit: password.chars().any(|c| c.is_ascii_digit()),
            symbol: password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }

    pub fn score(&self) -> u8 {
        [
            self.length,
            self.uppercase,
            self.lowercase,
            self.digit,
            self.symbol,
        ]
        .iter()
        .filter(|passed| **passed)
        .count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Fair,
    Strong,
    VeryStrong,
}

impl StrengthLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 | 1 => StrengthLevel::VeryWeak,
            2 => StrengthLevel::Weak,
            3 => StrengthLevel::Fair,
            4 => StrengthLevel::Strong,
            _ => StrengthLevel::VeryStrong,
        }
    }

    /// Colour band for the meter
    pub fn color(&self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "red",
            StrengthLevel::Weak => "orange",
            StrengthLevel::Fair => "yellow",
            StrengthLevel::Strong => "lime",
            StrengthLevel::VeryStrong => "green",
        }
    }

    pub fn label(&self, strings: &LanguageStrings) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => strings.strength_very_weak,
            StrengthLevel::Weak => strings.strength_weak,
            StrengthLevel::Fair => strings.strength_fair,
            StrengthLevel::Strong => strings.strength_strong,
            StrengthLevel::VeryStrong => strings.strength_very_strong,
        }
    }
}

/// Scorer result as sent to the strength meter
#[derive(Debug, Clone, Serialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub level: StrengthLevel,
    pub label: &'static str,
    pub color: &'static str,
    pub checks: StrengthChecks,
}

impl PasswordStrength {
    pub fn evaluate(password: &str, strings: &LanguageStrings) -> Self {
        let checks = StrengthChecks::evaluate(password);
        let score = checks.score();
        let level = StrengthLevel::from_score(score);
        Self {
            score,
            level,
            label: level.label(strings),
            color: level.color(),
            checks,
        }
    }
}
