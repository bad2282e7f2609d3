//! Request extractors for the visitor's language, signed-in session and
//! form input.
//!
//! A session token is read from `Authorization: Bearer <token>` first and
//! falls back to the `session` cookie. Form bodies and query strings that
//! fail to deserialize are answered as field errors.

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::AppState;
use crate::error::AppError;
use crate::i18n::{fill, Language, LanguageStrings};
use crate::models::{Session, User};

pub const SESSION_COOKIE: &str = "session";

/// Sensitive actions need the password re-entered within this many hours
pub const PASSWORD_TIMEOUT_HOURS: i64 = 3;

/// Language negotiated from `Accept-Language`
#[derive(Debug, Clone, Copy)]
pub struct Locale(pub Language);

impl Locale {
    pub fn strings(&self) -> &'static LanguageStrings {
        self.0.strings()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Locale(request_language(&parts.headers, state)))
    }
}

fn request_language(headers: &HeaderMap, state: &AppState) -> Language {
    let header = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    Language::negotiate(header, &state.config.default_locale)
}

/// Session token from the bearer header or the session cookie
pub fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// A signed-in user with a live session
#[derive(Debug, Clone)]
pub struct Auth {
    pub user: User,
    pub session: Session,
    pub language: Language,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let requested = request_language(&parts.headers, state);

        let token = session_token(parts).ok_or(AppError::Unauthenticated(requested))?;
        let session = state
            .db
            .find_session(&token)
            .await?
            .ok_or(AppError::Unauthenticated(requested))?;
        let user = state
            .db
            .find_user(session.user_id)
            .await?
            .ok_or(AppError::Unauthenticated(requested))?;

        state.db.touch_session(session.id).await?;

        // A saved profile locale beats the browser's preference
        let language = user
            .locale
            .as_deref()
            .and_then(|code| Language::from_code(code).ok())
            .unwrap_or(requested);

        Ok(Auth {
            user,
            session,
            language,
        })
    }
}

impl Auth {
    pub fn strings(&self) -> &'static LanguageStrings {
        self.language.strings()
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.user.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(self.strings().forbidden.to_string()))
        }
    }

    pub fn require_verified(&self) -> Result<(), AppError> {
        if self.user.is_verified() {
            Ok(())
        } else {
            Err(AppError::Forbidden(self.strings().email_not_verified.to_string()))
        }
    }

    /// Owners manage their own listings; admins manage everyone's
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.user.id == owner_id || self.user.is_admin()
    }

    pub fn require_recent_password(&self) -> Result<(), AppError> {
        let cutoff = Utc::now() - Duration::hours(PASSWORD_TIMEOUT_HOURS);
        match self.session.password_confirmed_at {
            Some(confirmed_at) if confirmed_at > cutoff => Ok(()),
            _ => Err(AppError::PasswordConfirmationRequired(self.language)),
        }
    }
}

/// Either a signed-in user or a guest, with the language to answer in
#[derive(Debug, Clone)]
pub struct MaybeAuth {
    pub auth: Option<Auth>,
    pub language: Language,
}

impl MaybeAuth {
    pub fn user_id(&self) -> Option<i64> {
        self.auth.as_ref().map(|auth| auth.user.id)
    }

    pub fn strings(&self) -> &'static LanguageStrings {
        self.language.strings()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(auth) => Ok(MaybeAuth {
                language: auth.language,
                auth: Some(auth),
            }),
            Err(AppError::Unauthenticated(language)) => Ok(MaybeAuth {
                auth: None,
                language,
            }),
            Err(e) => Err(e),
        }
    }
}

/// A JSON form body; undecodable input becomes a field error
#[derive(Debug, Clone, Copy, Default)]
pub struct FormJson<T>(pub T);

#[axum::async_trait]
impl<T> FromRequest<AppState> for FormJson<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let language = request_language(req.headers(), state);
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(FormJson(value)),
            Err(rejection) => Err(json_rejection(rejection, language.strings())),
        }
    }
}

fn json_rejection(rejection: JsonRejection, strings: &LanguageStrings) -> AppError {
    let detail = rejection.body_text();
    debug!("Rejected JSON body: {}", detail);

    match rejection {
        JsonRejection::JsonDataError(_) => match rejected_field(&detail) {
            Some(field) => {
                let template = if expects_integer(&detail) {
                    strings.field_integer
                } else {
                    strings.field_in
                };
                AppError::invalid(field, fill(template, &[("field", field.replace('_', " "))]))
            }
            None => AppError::invalid("body", strings.malformed_request),
        },
        _ => AppError::invalid("body", strings.malformed_request),
    }
}

/// Top-level field named in a deserialization error such as
/// `...target type: price: invalid type: string "", expected i64`
fn rejected_field(detail: &str) -> Option<&str> {
    let (_, rest) = detail.split_once("target type: ")?;
    let (path, _) = rest.split_once(": ")?;
    let field = path.split(['.', '[']).next()?;
    let plain = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    plain.then_some(field)
}

fn expects_integer(detail: &str) -> bool {
    ["expected i64", "expected i32", "expected u32", "expected u64"]
        .iter()
        .any(|expected| detail.contains(expected))
}

/// A query string; undecodable input becomes an error on `query`
#[derive(Debug, Clone, Copy, Default)]
pub struct FormQuery<T>(pub T);

#[axum::async_trait]
impl<T> FromRequestParts<AppState> for FormQuery<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Query::<T>::try_from_uri(&parts.uri) {
            Ok(Query(value)) => Ok(FormQuery(value)),
            Err(rejection) => {
                debug!("Rejected query string: {}", rejection.body_text());
                let strings = request_language(&parts.headers, state).strings();
                Err(AppError::invalid("query", strings.malformed_request))
            }
        }
    }
}

/// `Set-Cookie` value carrying a session token
pub fn session_cookie(token: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        lifetime.num_seconds().max(0)
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}
