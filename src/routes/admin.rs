//! Admin moderation: user roles and listing flags.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::i18n::fill;
use crate::models::{PageParams, Paginated, PropertyView, PublicUser, Role};
use crate::server::extract::{Auth, FormJson, FormQuery};
use crate::server::page::{flash, Page};
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(users))
        .route("/admin/users/:id/role", patch(update_role))
        .route("/admin/properties/:id", patch(update_property_flags))
}

#[derive(Debug, Serialize)]
struct UsersProps {
    users: Paginated<PublicUser>,
    roles: [&'static str; 3],
}

async fn users(
    State(state): State<AppState>,
    auth: Auth,
    FormQuery(params): FormQuery<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;

    let (page, per_page) = params.resolve(state.config.per_page);
    let users = state.db.list_users(page, per_page).await?.map(PublicUser::from);

    let props = UsersProps {
        users,
        roles: Role::ALL,
    };
    Page::for_user(&state.db, &auth, "Admin/Users", props).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RoleForm {
    pub role: String,
}

/// Changing roles is sensitive, so it needs a recently confirmed password
async fn update_role(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<i64>,
    FormJson(form): FormJson<RoleForm>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    auth.require_recent_password()?;
    let strings = auth.strings();

    let role = Role::parse(form.role.trim()).ok_or_else(|| {
        AppError::invalid("role", fill(strings.field_in, &[("field", "role".to_string())]))
    })?;

    // An admin's own role is fixed
    if id == auth.user.id {
        return Err(AppError::Forbidden(strings.forbidden.to_string()));
    }

    if !state.db.set_role(id, role).await? {
        return Err(AppError::NotFound(auth.language));
    }
    let user = state.db.find_user(id).await?.ok_or(AppError::NotFound(auth.language))?;
    info!(admin_id = auth.user.id, user_id = id, role = ?role, "Role changed");
    flash(&state.db, &auth, strings.role_updated).await?;

    Ok(Json(json!({
        "message": strings.role_updated,
        "user": PublicUser::from(user),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyFlagsForm {
    pub is_published: Option<bool>,
    pub is_featured: Option<bool>,
}

async fn update_property_flags(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<i64>,
    FormJson(form): FormJson<PropertyFlagsForm>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_admin()?;
    let strings = auth.strings();

    let property = state
        .db
        .set_property_flags(id, form.is_published, form.is_featured)
        .await?
        .ok_or(AppError::NotFound(auth.language))?;
    info!(
        admin_id = auth.user.id,
        property_id = id,
        published = property.is_published,
        featured = property.is_featured,
        "Listing flags changed"
    );
    flash(&state.db, &auth, strings.property_updated).await?;

    Ok(Json(json!({
        "message": strings.property_updated,
        "property": PropertyView::new(property, None),
    })))
}
