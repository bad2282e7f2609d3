//! Listing browse, detail, management, gallery uploads and owner inquiries.

use std::collections::HashSet;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{message, normalize_email, optional};
use crate::error::AppError;
use crate::i18n::{fill, LanguageStrings};
use crate::models::{
    ListingType, PageParams, Paginated, Property, PropertyDraft, PropertyFilter, PropertyType,
    PropertyView, PublicUser,
};
use crate::notify::Notification;
use crate::server::extract::{Auth, FormJson, FormQuery, MaybeAuth};
use crate::server::page::{flash, Page};
use crate::server::AppState;
use crate::uploads;
use crate::validation::Validator;

const FEATURED_LIMIT: i64 = 6;
const MAX_PRICE: i64 = 1_000_000_000_000;
const MAX_ROOMS: i64 = 50;
const MAX_SURFACE: i64 = 1_000_000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/properties", get(index).post(store))
        .route("/properties/featured", get(featured))
        .route("/properties/:id", get(show).put(update).delete(destroy))
        .route("/properties/:id/images", post(upload_images))
        .route("/properties/:id/contact", post(contact))
        .route("/my/properties", get(mine))
}

/// Favorite ids for a signed-in viewer; `None` for guests
async fn favorite_ids(state: &AppState, user_id: Option<i64>) -> Result<Option<HashSet<i64>>, AppError> {
    match user_id {
        Some(id) => Ok(Some(state.db.favorite_ids(id).await?)),
        None => Ok(None),
    }
}

fn to_view(favorites: &Option<HashSet<i64>>) -> impl Fn(Property) -> PropertyView + '_ {
    move |property| {
        let favorited = favorites.as_ref().map(|ids| ids.contains(&property.id));
        PropertyView::new(property, favorited)
    }
}

/// Load a listing the caller may edit
async fn managed_property(state: &AppState, auth: &Auth, id: i64) -> Result<Property, AppError> {
    let property = state.db.find_property(id).await?.ok_or(AppError::NotFound(auth.language))?;
    if !auth.can_manage(property.user_id) {
        return Err(AppError::Forbidden(auth.strings().forbidden.to_string()));
    }
    Ok(property)
}

// ==================== Browse ====================

#[derive(Debug, Serialize)]
struct IndexProps {
    properties: Paginated<PropertyView>,
    filters: PropertyFilter,
    property_types: [&'static str; 5],
    listing_types: [&'static str; 2],
}

async fn index(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    FormQuery(filter): FormQuery<PropertyFilter>,
    FormQuery(params): FormQuery<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = params.resolve(state.config.per_page);
    let favorites = favorite_ids(&state, viewer.user_id()).await?;
    let properties = state
        .db
        .list_published(&filter, page, per_page)
        .await?
        .map(to_view(&favorites));

    let props = IndexProps {
        properties,
        filters: filter,
        property_types: PropertyType::ALL,
        listing_types: ListingType::ALL,
    };
    Page::render(&state.db, &viewer, "Properties/Index", props).await
}

async fn featured(
    State(state): State<AppState>,
    viewer: MaybeAuth,
) -> Result<impl IntoResponse, AppError> {
    let favorites = favorite_ids(&state, viewer.user_id()).await?;
    let properties: Vec<PropertyView> = state
        .db
        .featured_properties(FEATURED_LIMIT)
        .await?
        .into_iter()
        .map(to_view(&favorites))
        .collect();

    Ok(Json(json!({ "properties": properties })))
}

#[derive(Debug, Serialize)]
struct ShowProps {
    property: PropertyView,
    owner: Option<PublicUser>,
    favorites: i64,
}

async fn show(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut property = state.db.find_property(id).await?.ok_or(AppError::NotFound(viewer.language))?;

    // Drafts stay hidden from everyone but their managers
    let manages = viewer
        .auth
        .as_ref()
        .is_some_and(|auth| auth.can_manage(property.user_id));
    if !property.is_published && !manages {
        return Err(AppError::NotFound(viewer.language));
    }

    if viewer.user_id() != Some(property.user_id) {
        state.db.increment_views(id).await?;
        property.views += 1;
    }

    let is_favorited = match viewer.user_id() {
        Some(user_id) => Some(state.db.is_favorited(user_id, id).await?),
        None => None,
    };
    let owner = state.db.find_user(property.user_id).await?.map(PublicUser::from);
    let favorites = state.db.favorite_count(id).await?;

    let props = ShowProps {
        property: PropertyView::new(property, is_favorited),
        owner,
        favorites,
    };
    Page::render(&state.db, &viewer, "Properties/Show", props).await
}

async fn mine(
    State(state): State<AppState>,
    auth: Auth,
    FormQuery(params): FormQuery<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, per_page) = params.resolve(state.config.per_page);
    let favorites = favorite_ids(&state, Some(auth.user.id)).await?;
    let properties = state
        .db
        .list_by_owner(auth.user.id, page, per_page)
        .await?
        .map(to_view(&favorites));

    Page::for_user(&state.db, &auth, "Properties/Mine", json!({ "properties": properties })).await
}

// ==================== Create / Update / Delete ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PropertyForm {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub property_type: String,
    pub listing_type: String,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub surface: i64,
    /// New listings are published unless stated otherwise
    pub is_published: Option<bool>,
}

impl PropertyForm {
    pub fn validate(self, strings: &LanguageStrings) -> Result<PropertyDraft, AppError> {
        let title = self.title.trim().to_string();
        let description = self.description.trim().to_string();
        let location = self.location.trim().to_string();

        let mut v = Validator::new(strings);
        v.required("title", &title)
            .max_len("title", &title, 255)
            .required("description", &description)
            .max_len("description", &description, 5000)
            .range_i64("price", self.price, 1, MAX_PRICE)
            .required("location", &location)
            .max_len("location", &location, 255)
            .required("property_type", &self.property_type)
            .one_of("property_type", &self.property_type, &PropertyType::ALL)
            .required("listing_type", &self.listing_type)
            .one_of("listing_type", &self.listing_type, &ListingType::ALL)
            .range_i64("bedrooms", self.bedrooms, 0, MAX_ROOMS)
            .range_i64("bathrooms", self.bathrooms, 0, MAX_ROOMS)
            .range_i64("surface", self.surface, 0, MAX_SURFACE);

        let property_type = PropertyType::parse(&self.property_type);
        let listing_type = ListingType::parse(&self.listing_type);
        v.finish()?;

        match (property_type, listing_type) {
            (Some(property_type), Some(listing_type)) => Ok(PropertyDraft {
                title,
                description,
                price: self.price,
                location,
                property_type,
                listing_type,
                bedrooms: self.bedrooms,
                bathrooms: self.bathrooms,
                surface: self.surface,
                is_published: self.is_published.unwrap_or(true),
            }),
            _ => Err(AppError::invalid(
                "property_type",
                fill(strings.field_in, &[("field", "property type".to_string())]),
            )),
        }
    }
}

async fn store(
    State(state): State<AppState>,
    auth: Auth,
    FormJson(form): FormJson<PropertyForm>,
) -> Result<impl IntoResponse, AppError> {
    auth.require_verified()?;
    let strings = auth.strings();
    let draft = form.validate(strings)?;

    let property = state.db.create_property(auth.user.id, &draft).await?;
    info!(user_id = auth.user.id, property_id = property.id, "Listing created");
    flash(&state.db, &auth, strings.property_created).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": strings.property_created,
            "property": PropertyView::new(property, Some(false)),
        })),
    ))
}

async fn update(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<i64>,
    FormJson(form): FormJson<PropertyForm>,
) -> Result<impl IntoResponse, AppError> {
    managed_property(&state, &auth, id).await?;
    let strings = auth.strings();
    let draft = form.validate(strings)?;

    let property = state
        .db
        .update_property(id, &draft)
        .await?
        .ok_or(AppError::NotFound(auth.language))?;
    let favorited = state.db.is_favorited(auth.user.id, id).await?;
    flash(&state.db, &auth, strings.property_updated).await?;

    Ok(Json(json!({
        "message": strings.property_updated,
        "property": PropertyView::new(property, Some(favorited)),
    })))
}

async fn destroy(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    managed_property(&state, &auth, id).await?;
    let strings = auth.strings();

    state.db.delete_property(id).await?;
    uploads::remove_dir(state.upload_root(), &uploads::property_dir(id)).await;
    info!(user_id = auth.user.id, property_id = id, "Listing deleted");
    flash(&state.db, &auth, strings.property_deleted).await?;

    Ok(message(strings.property_deleted))
}

async fn upload_images(
    State(state): State<AppState>,
    auth: Auth,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    managed_property(&state, &auth, id).await?;
    let strings = auth.strings();

    let images =
        uploads::read_images(&mut multipart, "images", state.config.max_upload_bytes, strings)
            .await?;

    let root = state.upload_root();
    let dir = uploads::property_dir(id);
    let paths = uploads::store_all(root, &dir, &images).await?;

    let property = match state.db.add_property_images(id, &paths).await {
        Ok(Some(property)) => property,
        Ok(None) => {
            // Deleted while uploading
            uploads::remove_dir(root, &dir).await;
            return Err(AppError::NotFound(auth.language));
        }
        Err(e) => {
            uploads::remove_files(root, &paths).await;
            return Err(e.into());
        }
    };
    info!(property_id = id, count = paths.len(), "Listing images uploaded");
    flash(&state.db, &auth, strings.images_uploaded).await?;

    Ok(Json(json!({
        "message": strings.images_uploaded,
        "property": PropertyView::new(property, None),
    })))
}

// ==================== Inquiries ====================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

async fn contact(
    State(state): State<AppState>,
    viewer: MaybeAuth,
    Path(id): Path<i64>,
    FormJson(form): FormJson<ContactForm>,
) -> Result<impl IntoResponse, AppError> {
    let strings = viewer.strings();
    let property = state.db.find_property(id).await?.ok_or(AppError::NotFound(viewer.language))?;
    if !property.is_published {
        return Err(AppError::NotFound(viewer.language));
    }

    let name = form.name.trim().to_string();
    let email = normalize_email(&form.email);
    let phone = optional(form.phone);
    let body = form.message.trim().to_string();

    let mut v = Validator::new(strings);
    v.required("name", &name)
        .max_len("name", &name, 255)
        .required("email", &email)
        .email("email", &email)
        .max_len("phone", phone.as_deref().unwrap_or_default(), 30)
        .required("message", &body)
        .min_len("message", &body, 10)
        .max_len("message", &body, 2000);
    v.finish()?;

    state.db.increment_contacts(id).await?;

    if let Some(owner) = state.db.find_user(property.user_id).await? {
        state.notifier.send(Notification::PropertyInquiry {
            to: owner.email,
            property_id: property.id,
            property_title: property.title,
            from_name: name,
            from_email: email,
            phone,
            message: body,
        });
    }

    if let Some(auth) = &viewer.auth {
        flash(&state.db, auth, strings.contact_sent).await?;
    }

    Ok(message(strings.contact_sent))
}
