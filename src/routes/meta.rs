//! Front-end support endpoints: string tables, languages, pending flash and the RSS feed.

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::profile::language_options;
use crate::error::AppError;
use crate::feed;
use crate::i18n::{Language, LanguageStrings};
use crate::server::extract::{Auth, Locale};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/translations/:code", get(translations))
        .route("/languages", get(languages))
        .route("/flash", get(take_flash))
        .route("/feed.xml", get(listings_feed))
}

async fn translations(
    Locale(requested): Locale,
    Path(code): Path<String>,
) -> Result<Json<&'static LanguageStrings>, AppError> {
    let language = Language::from_code(&code).map_err(|_| AppError::NotFound(requested))?;
    Ok(Json(language.strings()))
}

async fn languages() -> impl IntoResponse {
    Json(json!({
        "default": Language::canonical().code(),
        "languages": language_options(),
    }))
}

async fn take_flash(State(state): State<AppState>, auth: Auth) -> Result<impl IntoResponse, AppError> {
    let flash = state.db.take_flash(auth.session.id).await?;
    Ok(Json(json!({ "flash": flash })))
}

async fn listings_feed(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state.db.site_settings(&state.config.app_name).await?;
    let properties = state.db.latest_published(feed::FEED_SIZE).await?;
    let channel = feed::listings_channel(&settings.site_name, &state.config.app_url, &properties);

    Ok((
        [(CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        channel.to_string(),
    ))
}
