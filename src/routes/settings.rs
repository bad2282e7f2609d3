//! Site-wide settings: public read, admin write.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::models::SiteSettings;
use crate::server::extract::{Auth, FormJson};
use crate::server::page::flash;
use crate::server::AppState;
use crate::validation::Validator;

const SOCIAL_KEYS: [&str; 4] = ["facebook", "twitter", "instagram", "linkedin"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(show))
        .route("/admin/settings", put(update))
}

async fn show(State(state): State<AppState>) -> Result<Json<SiteSettings>, AppError> {
    Ok(Json(state.db.site_settings(&state.config.app_name).await?))
}

/// Saves only known keys; anything else in the body is ignored
async fn update(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    let strings = auth.strings();

    let values: Vec<(String, String)> = form
        .into_iter()
        .filter(|(key, _)| SiteSettings::KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key, value.trim().to_string()))
        .collect();

    let mut v = Validator::new(strings);
    for (key, value) in &values {
        match key.as_str() {
            "site_name" => {
                v.required(key, value).max_len(key, value, 255);
            }
            "contact_email" => {
                v.email(key, value).max_len(key, value, 255);
            }
            key if SOCIAL_KEYS.contains(&key) => {
                v.url(key, value);
            }
            _ => {
                v.max_len(key, value, 255);
            }
        }
    }
    v.finish()?;

    state.db.set_settings(&values).await?;
    info!(admin_id = auth.user.id, keys = values.len(), "Site settings saved");
    flash(&state.db, &auth, strings.settings_updated).await?;

    let settings = state.db.site_settings(&state.config.app_name).await?;
    Ok(Json(json!({
        "message": strings.settings_updated,
        "settings": settings,
    })))
}
