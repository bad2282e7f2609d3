use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

// ==================== Users ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    Admin,
}

impl Role {
    pub const ALL: [&'static str; 3] = ["user", "agent", "admin"];

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "agent" => Some(Role::Agent),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub locale: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub verification_token: Option<String>,
    pub photo_path: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// User as exposed to the front end: no hash, no tokens
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub locale: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub photo_url: Option<String>,
    pub facebook: Option<String>,
    pub twitter: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            role: user.role,
            locale: user.locale,
            email_verified_at: user.email_verified_at,
            photo_url: user.photo_path.as_deref().map(storage_url),
            facebook: user.facebook,
            twitter: user.twitter,
            instagram: user.instagram,
            linkedin: user.linkedin,
            created_at: user.created_at,
        }
    }
}

/// Profile fields a user may change about themselves
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
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

/// Public URL of a file stored below the upload root
pub fn storage_url(path: &str) -> String {
    format!("/storage/{}", path.trim_start_matches('/'))
}

// ==================== Sessions ====================

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub password_confirmed_at: Option<DateTime<Utc>>,
    pub flash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PasswordReset {
    pub email: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

// ==================== Properties ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Villa,
    Land,
    Office,
}

impl PropertyType {
    pub const ALL: [&'static str; 5] = ["apartment", "house", "villa", "land", "office"];

    pub fn parse(value: &str) -> Option<PropertyType> {
        match value {
            "apartment" => Some(PropertyType::Apartment),
            "house" => Some(PropertyType::House),
            "villa" => Some(PropertyType::Villa),
            "land" => Some(PropertyType::Land),
            "office" => Some(PropertyType::Office),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Villa => "villa",
            PropertyType::Land => "land",
            PropertyType::Office => "office",
        }
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PropertyType::parse(value).ok_or_else(|| format!("unknown property type `{}`", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    pub const ALL: [&'static str; 2] = ["sale", "rent"];

    pub fn parse(value: &str) -> Option<ListingType> {
        match value {
            "sale" => Some(ListingType::Sale),
            "rent" => Some(ListingType::Rent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "sale",
            ListingType::Rent => "rent",
        }
    }
}

impl FromStr for ListingType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ListingType::parse(value).ok_or_else(|| format!("unknown listing type `{}`", value))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Property {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub surface: i64,
    pub images: Json<Vec<String>>,
    pub is_published: bool,
    pub is_featured: bool,
    pub views: i64,
    pub contacts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated listing fields, used for both create and update
#[derive(Debug, Clone)]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub surface: i64,
    pub is_published: bool,
}

/// Listing as rendered by cards and detail pages
#[derive(Debug, Clone, Serialize)]
pub struct PropertyView {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub location: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub bedrooms: i64,
    pub bathrooms: i64,
    pub surface: i64,
    pub images: Vec<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub views: i64,
    pub contacts: i64,
    /// `None` for guests
    pub is_favorited: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PropertyView {
    pub fn new(property: Property, is_favorited: Option<bool>) -> Self {
        Self {
            id: property.id,
            user_id: property.user_id,
            title: property.title,
            description: property.description,
            price: property.price,
            location: property.location,
            property_type: property.property_type,
            listing_type: property.listing_type,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            surface: property.surface,
            images: property.images.0.iter().map(|p| storage_url(p)).collect(),
            is_published: property.is_published,
            is_featured: property.is_featured,
            views: property.views,
            contacts: property.contacts,
            is_favorited,
            created_at: property.created_at,
            updated_at: property.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Popular,
}

impl Sort {
    pub fn order_by(&self) -> &'static str {
        match self {
            Sort::Newest => "created_at DESC, id DESC",
            Sort::PriceAsc => "price ASC, id DESC",
            Sort::PriceDesc => "price DESC, id DESC",
            Sort::Popular => "views DESC, id DESC",
        }
    }
}

impl FromStr for Sort {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "newest" => Ok(Sort::Newest),
            "price_asc" => Ok(Sort::PriceAsc),
            "price_desc" => Ok(Sort::PriceDesc),
            "popular" => Ok(Sort::Popular),
            _ => Err(format!("unknown sort `{}`", value)),
        }
    }
}

/// Browse filters for the public listing index.
///
/// Search forms submit every input, so `type=` or `min_price=` means the
/// filter is off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyFilter {
    #[serde(deserialize_with = "blank_as_none")]
    pub search: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub location: Option<String>,
    #[serde(rename = "type", deserialize_with = "blank_as_none")]
    pub property_type: Option<PropertyType>,
    #[serde(rename = "listing", deserialize_with = "blank_as_none")]
    pub listing_type: Option<ListingType>,
    #[serde(deserialize_with = "blank_as_none")]
    pub min_price: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub max_price: Option<i64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub bedrooms: Option<i64>,
    #[serde(deserialize_with = "blank_as_default")]
    pub sort: Sort,
}

/// Query value parsed with `FromStr`; empty or whitespace is `None`
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn blank_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_default())
}

/// Totals shown on an owner's dashboard
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct OwnerStats {
    pub properties: i64,
    pub published: i64,
    pub views: i64,
    pub contacts: i64,
}

/// Site-wide totals for the admin dashboard
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct SiteStats {
    pub users: i64,
    pub properties: i64,
    pub published: i64,
    pub featured: i64,
    pub views: i64,
    pub contacts: i64,
}

// ==================== Pagination ====================

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PageParams {
    #[serde(deserialize_with = "blank_as_none")]
    pub page: Option<u32>,
    #[serde(deserialize_with = "blank_as_none")]
    pub per_page: Option<u32>,
}

impl PageParams {
    pub const MAX_PER_PAGE: u32 = 50;

    /// (page, per_page) with page ≥ 1 and per_page in 1..=50
    pub fn resolve(&self, default_per_page: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(default_per_page)
            .clamp(1, Self::MAX_PER_PAGE);
        (page, per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, current_page: u32, per_page: u32, total: i64) -> Self {
        let last_page = ((total.max(0) as u64).div_ceil(per_page as u64)).max(1) as u32;
        Self {
            data,
            current_page,
            last_page,
            per_page,
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

/// Row offset for a 1-based page
pub fn offset(page: u32, per_page: u32) -> i64 {
    (page.saturating_sub(1) as i64) * per_page as i64
}

// ==================== Settings ====================

/// Site-wide settings with their storage keys
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SiteSettings {
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub facebook: String,
    pub twitter: String,
    pub instagram: String,
    pub linkedin: String,
}

impl SiteSettings {
    pub const KEYS: [&'static str; 8] = [
        "site_name",
        "contact_email",
        "contact_phone",
        "address",
        "facebook",
        "twitter",
        "instagram",
        "linkedin",
    ];

    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "site_name" => self.site_name = value,
            "contact_email" => self.contact_email = value,
            "contact_phone" => self.contact_phone = value,
            "address" => self.address = value,
            "facebook" => self.facebook = value,
            "twitter" => self.twitter = value,
            "instagram" => self.instagram = value,
            "linkedin" => self.linkedin = value,
            _ => {}
        }
    }
}
