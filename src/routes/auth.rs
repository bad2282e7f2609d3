//! Registration, login, password resets, email verification and password confirmation.

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{message, normalize_email, optional, unique_to_validation};
use crate::db::NewUser;
use crate::error::AppError;
use crate::i18n::fill;
use crate::models::{PublicUser, Role};
use crate::notify::{reset_url, verification_url, Notification};
use crate::password::{PasswordStrength, MIN_PASSWORD_LENGTH};
use crate::security::{constant_time_compare, generate_token, hash_password, verify_password};
use crate::server::extract::{
    clear_session_cookie, session_cookie, Auth, FormJson, FormQuery, Locale, MaybeAuth,
};
use crate::server::page::{flash, Page};
use crate::server::AppState;
use crate::validation::Validator;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/reset-password/:token", get(show_reset_form))
        .route("/verify-email/:id/:token", get(verify_email))
        .route("/email/verification-notification", post(resend_verification))
        .route("/confirm-password", post(confirm_password))
        .route("/password", put(update_password))
        .route("/password/strength", post(password_strength))
}

/// Shared rules for every form that sets a new password
fn validate_new_password(v: &mut Validator<'_>, password: &str, confirmation: &str) {
    v.required("password", password)
        .min_len("password", password, MIN_PASSWORD_LENGTH)
        .max_len("password", password, 255)
        .confirmed("password", password, confirmation);
}

// ==================== Registration ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub phone: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Locale(language): Locale,
    FormJson(form): FormJson<RegisterForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = language.strings();
    let name = form.name.trim().to_string();
    let email = normalize_email(&form.email);
    let phone = optional(form.phone);

    let mut v = Validator::new(strings);
    v.required("name", &name)
        .max_len("name", &name, 255)
        .required("email", &email)
        .email("email", &email)
        .max_len("email", &email, 255);
    validate_new_password(&mut v, &form.password, &form.password_confirmation);
    if let Some(phone) = &phone {
        v.max_len("phone", phone, 30);
    }
    if !v.has_error("email") && state.db.email_taken(&email, None).await? {
        v.unique_violation("email");
    }
    v.finish()?;

    let role = if state.config.admin_email.as_deref() == Some(email.as_str()) {
        Role::Admin
    } else {
        Role::User
    };
    let verification_token = generate_token();
    let taken = fill(strings.field_unique, &[("field", "email".to_string())]);

    let user = state
        .db
        .create_user(&NewUser {
            name,
            email,
            password_hash: hash_password(&form.password)?,
            phone,
            role,
            verification_token: Some(verification_token.clone()),
        })
        .await
        .map_err(|e| unique_to_validation(e, "email", &taken))?;

    info!(user_id = user.id, role = ?user.role, "Registered new user");
    state.notifier.send(Notification::VerifyEmail {
        to: user.email.clone(),
        url: verification_url(&state.config.app_url, user.id, &verification_token),
    });

    let lifetime = state.session_lifetime(false);
    let session = state.db.create_session(user.id, lifetime).await?;
    state.db.set_flash(session.id, strings.registered).await?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&session.token, lifetime))],
        Json(json!({
            "token": session.token,
            "user": PublicUser::from(user),
        })),
    ))
}

// ==================== Login / Logout ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember: bool,
}

async fn login(
    State(state): State<AppState>,
    Locale(language): Locale,
    FormJson(form): FormJson<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = language.strings();
    let email = normalize_email(&form.email);

    let mut v = Validator::new(strings);
    v.required("email", &email)
        .email("email", &email)
        .required("password", &form.password);
    v.finish()?;

    let user = match state.db.find_user_by_email(&email).await? {
        Some(user) if verify_password(&form.password, &user.password_hash) => user,
        _ => {
            info!("Failed login attempt");
            return Err(AppError::invalid("email", strings.credentials_mismatch));
        }
    };

    let lifetime = state.session_lifetime(form.remember);
    let session = state.db.create_session(user.id, lifetime).await?;
    info!(user_id = user.id, remember = form.remember, "User logged in");

    Ok((
        [(SET_COOKIE, session_cookie(&session.token, lifetime))],
        Json(json!({
            "token": session.token,
            "user": PublicUser::from(user),
        })),
    ))
}

async fn logout(State(state): State<AppState>, auth: Auth) -> Result<impl IntoResponse, AppError> {
    state.db.delete_session(auth.session.id).await?;
    info!(user_id = auth.user.id, "User logged out");

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        message(auth.strings().logged_out),
    ))
}

// ==================== Password Reset ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Same answer whether or not the address has an account
async fn forgot_password(
    State(state): State<AppState>,
    Locale(language): Locale,
    FormJson(form): FormJson<ForgotPasswordForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = language.strings();
    let email = normalize_email(&form.email);

    let mut v = Validator::new(strings);
    v.required("email", &email).email("email", &email);
    v.finish()?;

    if let Some(user) = state.db.find_user_by_email(&email).await? {
        let token = generate_token();
        state
            .db
            .store_reset_token(&user.email, &hash_password(&token)?)
            .await?;
        state.notifier.send(Notification::ResetPassword {
            to: user.email.clone(),
            url: reset_url(&state.config.app_url, &user.email, &token),
        });
    }

    Ok(message(strings.reset_link_sent))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetLinkQuery {
    pub email: String,
}

/// Landing page for the emailed reset link; the form posts to `/reset-password`
async fn show_reset_form(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    Path(token): Path<String>,
    FormQuery(query): FormQuery<ResetLinkQuery>,
) -> Result<impl IntoResponse, AppError> {
    let props = json!({
        "token": token,
        "email": normalize_email(&query.email),
    });
    Page::render(&state.db, &viewer, "Auth/ResetPassword", props).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResetPasswordForm {
    pub token: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

async fn reset_password(
    State(state): State<AppState>,
    Locale(language): Locale,
    FormJson(form): FormJson<ResetPasswordForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = language.strings();
    let email = normalize_email(&form.email);

    let mut v = Validator::new(strings);
    v.required("token", &form.token)
        .required("email", &email)
        .email("email", &email);
    validate_new_password(&mut v, &form.password, &form.password_confirmation);
    v.finish()?;

    let invalid = || AppError::invalid("email", strings.invalid_reset_token);
    let ttl = Duration::minutes(state.config.reset_token_ttl_minutes);

    let record = state.db.find_reset_token(&email).await?.ok_or_else(invalid)?;
    let fresh = record.created_at + ttl > Utc::now();
    if !fresh || !verify_password(&form.token, &record.token_hash) {
        return Err(invalid());
    }
    let user = state.db.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    state
        .db
        .update_password(user.id, &hash_password(&form.password)?)
        .await?;
    state.db.delete_reset_token(&email).await?;
    let revoked = state.db.delete_user_sessions(user.id, None).await?;
    info!(user_id = user.id, revoked, "Password reset");

    Ok(message(strings.password_reset))
}

// ==================== Email Verification ====================

async fn verify_email(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    Path((id, token)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let strings = viewer.strings();
    let invalid = || AppError::Forbidden(strings.invalid_verification_link.to_string());

    let user = state.db.find_user(id).await?.ok_or_else(invalid)?;

    if !user.is_verified() {
        let matches = user
            .verification_token
            .as_deref()
            .is_some_and(|expected| constant_time_compare(expected, &token));
        if !matches {
            return Err(invalid());
        }
        state.db.mark_email_verified(user.id).await?;
        info!(user_id = user.id, "Email verified");
    }

    if let Some(auth) = &viewer.auth {
        flash(&state.db, auth, strings.email_verified).await?;
    }

    Ok(Json(json!({
        "message": strings.email_verified,
        "verified": true,
    })))
}

async fn resend_verification(
    State(state): State<AppState>,
    auth: Auth,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();
    if auth.user.is_verified() {
        return Ok(message(strings.email_verified));
    }

    let token = generate_token();
    state.db.set_verification_token(auth.user.id, &token).await?;
    state.notifier.send(Notification::VerifyEmail {
        to: auth.user.email.clone(),
        url: verification_url(&state.config.app_url, auth.user.id, &token),
    });
    flash(&state.db, &auth, strings.verification_link_sent).await?;

    Ok(message(strings.verification_link_sent))
}

// ==================== Password Confirmation / Change ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmPasswordForm {
    pub password: String,
}

async fn confirm_password(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<ConfirmPasswordForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();
    if !verify_password(&form.password, &auth.user.password_hash) {
        return Err(AppError::invalid("password", strings.current_password));
    }

    state.db.confirm_session_password(auth.session.id).await?;
    Ok(message(strings.password_confirmed))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePasswordForm {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

async fn update_password(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<UpdatePasswordForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();

    let mut v = Validator::new(strings);
    v.required("current_password", &form.current_password);
    if !v.has_error("current_password")
        && !verify_password(&form.current_password, &auth.user.password_hash)
    {
        v.add("current_password", strings.current_password);
    }
    validate_new_password(&mut v, &form.password, &form.password_confirmation);
    v.finish()?;

    state
        .db
        .update_password(auth.user.id, &hash_password(&form.password)?)
        .await?;
    // Other devices must sign in again
    state
        .db
        .delete_user_sessions(auth.user.id, Some(auth.session.id))
        .await?;
    flash(&state.db, &auth, strings.password_updated).await?;

    Ok(message(strings.password_updated))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StrengthForm {
    pub password: String,
}

async fn password_strength(
    Locale(language): Locale,
    FormJson(form): FormJson<StrengthForm>,
) -> Json<PasswordStrength> {
    Json(PasswordStrength::evaluate(&form.password, language.strings()))
}
