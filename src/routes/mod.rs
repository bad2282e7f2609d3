//! Request handlers, one module per area of the site.
//!
//! Each module exposes `routes()` returning a stateful router that
//! [`crate::server::router`] merges.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod favorites;
pub mod meta;
pub mod profile;
pub mod properties;
pub mod settings;

use axum::Json;
use serde_json::{json, Value};

use crate::error::AppError;

/// `{"message": ..}` body for mutations that return nothing else
pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

/// Trimmed, lowercased email as stored and compared
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank optional text becomes `None`
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Turn a UNIQUE constraint failure into a validation error on `field`
pub(crate) fn unique_to_validation(e: sqlx::Error, field: &str, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::invalid(field, message)
        }
        _ => AppError::Database(e),
    }
}
