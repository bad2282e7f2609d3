use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::i18n::Language;
use crate::validation::ValidationErrors;

/// Every failure a request handler can produce.
///
/// Every variant answers in the visitor's language: validation and
/// forbidden messages are localized when raised, the rest carry the language.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{}", .0.first_message().unwrap_or_default())]
    Validation(ValidationErrors),

    #[error("Unauthenticated")]
    Unauthenticated(Language),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound(Language),

    #[error("Password confirmation required")]
    PasswordConfirmationRequired(Language),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::default();
        errors.add(field, message);
        AppError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PasswordConfirmationRequired(_) => StatusCode::LOCKED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => json!({
                "message": errors.first_message().unwrap_or_default(),
                "errors": errors,
            }),
            AppError::Unauthenticated(language) => {
                json!({ "message": language.strings().unauthenticated })
            }
            AppError::Forbidden(message) => json!({ "message": message }),
            AppError::NotFound(language) => json!({ "message": language.strings().not_found }),
            AppError::PasswordConfirmationRequired(language) => {
                json!({ "message": language.strings().password_confirmation_required })
            }
            AppError::Database(e) => {
                error!("Database error while handling request: {}", e);
                json!({ "message": "Server Error" })
            }
            AppError::Internal(e) => {
                error!("Internal error while handling request: {:#}", e);
                json!({ "message": "Server Error" })
            }
        };

        (status, Json(body)).into_response()
    }
}
