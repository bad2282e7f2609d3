//! The signed-in user's own profile: details, photo and account deletion.

use axum::{
    extract::{Multipart, State},
    http::header::SET_COOKIE,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{message, normalize_email, optional, unique_to_validation};
use crate::error::AppError;
use crate::i18n::{fill, Language, LanguageRegistry};
use crate::models::{ProfileUpdate, PublicUser};
use crate::notify::{verification_url, Notification};
use crate::security::{generate_token, verify_password};
use crate::server::extract::{clear_session_cookie, Auth, FormJson};
use crate::server::page::{flash, Page};
use crate::server::AppState;
use crate::uploads;
use crate::validation::Validator;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(edit).patch(update).delete(destroy))
        .route("/profile/photo", post(update_photo))
}

#[derive(Debug, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

#[derive(Debug, Serialize)]
struct EditProps {
    user: PublicUser,
    must_verify_email: bool,
    languages: Vec<LanguageOption>,
}

pub fn language_options() -> Vec<LanguageOption> {
    LanguageRegistry::get()
        .list_enabled()
        .into_iter()
        .map(|config| LanguageOption {
            code: config.code,
            name: config.name,
            native_name: config.native_name,
        })
        .collect()
}

async fn edit(State(state): State<AppState>, auth: Auth) -> Result<impl IntoResponse, AppError> {
    let props = EditProps {
        user: PublicUser::from(auth.user.clone()),
        must_verify_email: !auth.user.is_verified(),
        languages: language_options(),
    };
    Page::for_user(&state.db, &auth, "Profile/Edit", props).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub locale: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<ProfileForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();
    let update = ProfileUpdate {
        name: form.name.trim().to_string(),
        email: normalize_email(&form.email),
        phone: optional(form.phone),
        address: optional(form.address),
        locale: optional(form.locale),
        facebook: optional(form.facebook),
        twitter: optional(form.twitter),
        instagram: optional(form.instagram),
        linkedin: optional(form.linkedin),
    };

    let mut v = Validator::new(strings);
    v.required("name", &update.name)
        .max_len("name", &update.name, 255)
        .required("email", &update.email)
        .email("email", &update.email)
        .max_len("email", &update.email, 255)
        .max_len("phone", update.phone.as_deref().unwrap_or_default(), 30)
        .max_len("address", update.address.as_deref().unwrap_or_default(), 255);
    if let Some(locale) = &update.locale {
        let codes: Vec<&str> = language_options().iter().map(|l| l.code).collect();
        v.one_of("locale", locale, &codes);
    }
    for (field, value) in [
        ("facebook", &update.facebook),
        ("twitter", &update.twitter),
        ("instagram", &update.instagram),
        ("linkedin", &update.linkedin),
    ] {
        v.url(field, value.as_deref().unwrap_or_default());
    }
    if !v.has_error("email") && state.db.email_taken(&update.email, Some(auth.user.id)).await? {
        v.unique_violation("email");
    }
    v.finish()?;

    let email_changed = update.email != normalize_email(&auth.user.email);
    let reverify_token = email_changed.then(generate_token);
    let taken = fill(strings.field_unique, &[("field", "email".to_string())]);

    let user = state
        .db
        .update_profile(auth.user.id, &update, reverify_token.as_deref())
        .await
        .map_err(|e| unique_to_validation(e, "email", &taken))?;

    if let Some(token) = &reverify_token {
        info!(user_id = user.id, "Email changed, verification reset");
        state.notifier.send(Notification::VerifyEmail {
            to: user.email.clone(),
            url: verification_url(&state.config.app_url, user.id, token),
        });
    }

    // Answer in the language the user just picked
    let strings = user
        .locale
        .as_deref()
        .and_then(|code| Language::from_code(code).ok())
        .map(|language| language.strings())
        .unwrap_or(strings);
    flash(&state.db, &auth, strings.profile_updated).await?;

    Ok(Json(json!({
        "message": strings.profile_updated,
        "user": PublicUser::from(user),
    })))
}

async fn update_photo(
    State(state): State<AppState>,
    auth: Auth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();
    let image =
        uploads::read_image(&mut multipart, "photo", state.config.max_upload_bytes, strings)
            .await?;

    let path = uploads::store(state.upload_root(), "photos", &image).await?;
    if let Err(e) = state.db.set_photo(auth.user.id, Some(&path)).await {
        uploads::remove_file(state.upload_root(), &path).await;
        return Err(e.into());
    }

    if let Some(previous) = &auth.user.photo_path {
        uploads::remove_file(state.upload_root(), previous).await;
    }
    flash(&state.db, &auth, strings.photo_updated).await?;

    let user = state
        .db
        .find_user(auth.user.id)
        .await?
        .ok_or(AppError::Unauthenticated(auth.language))?;

    Ok(Json(json!({
        "message": strings.photo_updated,
        "user": PublicUser::from(user),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAccountForm {
    pub password: String,
}

async fn destroy(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<DeleteAccountForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = auth.strings();

    let mut v = Validator::new(strings);
    v.required("password", &form.password);
    if !v.has_error("password") && !verify_password(&form.password, &auth.user.password_hash) {
        v.add("password", strings.current_password);
    }
    v.finish()?;

    let property_ids = state.db.property_ids_by_owner(auth.user.id).await?;
    state.db.delete_user(auth.user.id).await?;

    let root = state.upload_root();
    for id in property_ids {
        uploads::remove_dir(root, &uploads::property_dir(id)).await;
    }
    if let Some(photo) = &auth.user.photo_path {
        uploads::remove_file(root, photo).await;
    }
    info!(user_id = auth.user.id, "Account deleted");

    Ok((
        [(SET_COOKIE, clear_session_cookie())],
        message(strings.account_deleted),
    ))
}
