//! Saved listings. Add and remove are idempotent so an optimistic client can
//! replay the desired state safely.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{PageParams, Paginated, Property, PropertyView};
use crate::server::extract::{Auth, FormQuery};
use crate::server::page::Page;
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(index))
        .route("/favorites/:property_id", put(add).delete(remove))
        .route("/favorites/:property_id/toggle", post(toggle))
}

/// State of one heart after a change
#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub property_id: i64,
    pub favorited: bool,
    pub count: i64,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
struct IndexProps {
    favorites: Paginated<PropertyView>,
}

async fn index(
    State(state): State<AppState>,
    auth: Auth,
    FormQuery(params): FormQuery<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = params.resolve(state.config.per_page);
    let favorites = state
        .db
        .list_favorites(auth.user.id, page, per_page)
        .await?
        .map(|property| PropertyView::new(property, Some(true)));

    Page::for_user(&state.db, &auth, "Favorites/Index", IndexProps { favorites }).await
}

/// Listings that can be favorited: published, or managed by the caller
async fn favoritable(state: &AppState, auth: &Auth, property_id: i64) -> Result<Property, AppError> {
    let property = state
        .db
        .find_property(property_id)
        .await?
        .ok_or(AppError::NotFound(auth.language))?;
    if !property.is_published && !auth.can_manage(property.user_id) {
        return Err(AppError::NotFound(auth.language));
    }
    Ok(property)
}

async fn respond(state: &AppState, auth: &Auth, property_id: i64, favorited: bool) -> Result<Json<FavoriteState>, AppError> {
    let strings = auth.strings();
    Ok(Json(FavoriteState {
        property_id,
        favorited,
        count: state.db.favorite_count(property_id).await?,
        message: if favorited {
            strings.favorite_added
        } else {
            strings.favorite_removed
        },
    }))
}

async fn add(
    State(state): State<AppState>,
    auth: Auth,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    favoritable(&state, &auth, property_id).await?;
    state.db.add_favorite(auth.user.id, property_id).await?;
    respond(&state, &auth, property_id, true).await
}

async fn remove(
    State(state): State<AppState>,
    auth: Auth,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    state
        .db
        .find_property(property_id)
        .await?
        .ok_or(AppError::NotFound(auth.language))?;
    state.db.remove_favorite(auth.user.id, property_id).await?;
    respond(&state, &auth, property_id, false).await
}

async fn toggle(
    State(state): State<AppState>,
    auth: Auth,
    Path(property_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    favoritable(&state, &auth, property_id).await?;
    let favorited = state.db.toggle_favorite(auth.user.id, property_id).await?;
    respond(&state, &auth, property_id, favorited).await
}
