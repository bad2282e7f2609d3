//! Owner and admin dashboards.

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use serde::Serialize;

use crate::error::AppError;
use crate::models::{OwnerStats, PropertyView, PublicUser, SiteStats};
use crate::server::extract::Auth;
use crate::server::page::Page;
use crate::server::AppState;

const RECENT_LIMIT: i64 = 5;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/admin/dashboard", get(admin_dashboard))
}

#[derive(Debug, Serialize)]
struct DashboardProps {
    stats: OwnerStats,
    favorites: i64,
    recent: Vec<PropertyView>,
}

async fn dashboard(State(state): State<AppState>, auth: Auth) -> Result<impl IntoResponse, AppError> {
    let stats = state.db.owner_stats(auth.user.id).await?;
    let favorites = state.db.user_favorite_count(auth.user.id).await?;
    let favorite_ids = state.db.favorite_ids(auth.user.id).await?;
    let recent = state
        .db
        .recent_by_owner(auth.user.id, RECENT_LIMIT)
        .await?
        .into_iter()
        .map(|property| {
            let favorited = favorite_ids.contains(&property.id);
            PropertyView::new(property, Some(favorited))
        })
        .collect();

    let props = DashboardProps {
        stats,
        favorites,
        recent,
    };
    Page::for_user(&state.db, &auth, "Dashboard", props).await
}

#[derive(Debug, Serialize)]
struct AdminDashboardProps {
    stats: SiteStats,
    recent_users: Vec<PublicUser>,
}

async fn admin_dashboard(
    State(state): State<AppState>,
    auth: Auth,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    let stats = state.db.site_stats().await?;
    let recent_users = state
        .db
        .recent_users(RECENT_LIMIT)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();

    let props = AdminDashboardProps {
        stats,
        recent_users,
    };
    Page::for_user(&state.db, &auth, "Admin/Dashboard", props).await
}
