use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::Database;
use crate::models::{
    offset, OwnerStats, Paginated, Property, PropertyDraft, PropertyFilter, SiteStats,
};

/// Escape LIKE wildcards in user input (used with `ESCAPE '\'`)
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append the WHERE clause shared by the count and page queries
fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &PropertyFilter) {
    builder.push(" WHERE is_published = 1");

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        builder
            .push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR location LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(location) = filter.location.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder
            .push(" AND location LIKE ")
            .push_bind(format!("%{}%", escape_like(location)))
            .push(" ESCAPE '\\'");
    }

    if let Some(property_type) = filter.property_type {
        builder.push(" AND property_type = ").push_bind(property_type);
    }

    if let Some(listing_type) = filter.listing_type {
        builder.push(" AND listing_type = ").push_bind(listing_type);
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }

    if let Some(bedrooms) = filter.bedrooms {
        builder.push(" AND bedrooms >= ").push_bind(bedrooms);
    }
}

impl Database {
    pub async fn create_property(&self, user_id: i64, draft: &PropertyDraft) -> sqlx::Result<Property> {
        let now = Utc::now();
        sqlx::query_as::<_, Property>(
            "INSERT INTO properties (user_id, title, description, price, location, property_type, listing_type,
                 bedrooms, bathrooms, surface, images, is_published, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, '[]', ?11, ?12, ?12)
             RETURNING *",
        )
        .bind(user_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.location)
        .bind(draft.property_type)
        .bind(draft.listing_type)
        .bind(draft.bedrooms)
        .bind(draft.bathrooms)
        .bind(draft.surface)
        .bind(draft.is_published)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_property(&self, id: i64) -> sqlx::Result<Option<Property>> {
        sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn update_property(&self, id: i64, draft: &PropertyDraft) -> sqlx::Result<Option<Property>> {
        sqlx::query_as::<_, Property>(
            "UPDATE properties SET title = ?1, description = ?2, price = ?3, location = ?4, property_type = ?5,
                 listing_type = ?6, bedrooms = ?7, bathrooms = ?8, surface = ?9, is_published = ?10, updated_at = ?11
             WHERE id = ?12
             RETURNING *",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.location)
        .bind(draft.property_type)
        .bind(draft.listing_type)
        .bind(draft.bedrooms)
        .bind(draft.bathrooms)
        .bind(draft.surface)
        .bind(draft.is_published)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_property(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM properties WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Published listings matching `filter`
    pub async fn list_published(
        &self,
        filter: &PropertyFilter,
        page: u32,
        per_page: u32,
    ) -> sqlx::Result<Paginated<Property>> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM properties");
        push_filters(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::<Sqlite>::new("SELECT * FROM properties");
        push_filters(&mut page_query, filter);
        page_query
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(per_page as i64)
            .push(" OFFSET ")
            .push_bind(offset(page, per_page));

        let properties = page_query
            .build_query_as::<Property>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Paginated::new(properties, page, per_page, total))
    }

    /// All of an owner's listings, published or not
    pub async fn list_by_owner(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> sqlx::Result<Paginated<Property>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let properties = sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(per_page as i64)
        .bind(offset(page, per_page))
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(properties, page, per_page, total))
    }

    pub async fn featured_properties(&self, limit: i64) -> sqlx::Result<Vec<Property>> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE is_published = 1 AND is_featured = 1
             ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn latest_published(&self, limit: i64) -> sqlx::Result<Vec<Property>> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE is_published = 1 ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Ids of every listing an owner has, for cleaning up their files
    pub async fn property_ids_by_owner(&self, user_id: i64) -> sqlx::Result<Vec<i64>> {
        sqlx::query_scalar("SELECT id FROM properties WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn recent_by_owner(&self, user_id: i64, limit: i64) -> sqlx::Result<Vec<Property>> {
        sqlx::query_as::<_, Property>(
            "SELECT * FROM properties WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn increment_views(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("UPDATE properties SET views = views + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn increment_contacts(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("UPDATE properties SET contacts = contacts + 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Admin moderation; `None` leaves a flag unchanged
    pub async fn set_property_flags(
        &self,
        id: i64,
        is_published: Option<bool>,
        is_featured: Option<bool>,
    ) -> sqlx::Result<Option<Property>> {
        sqlx::query_as::<_, Property>(
            "UPDATE properties SET is_published = COALESCE(?1, is_published), is_featured = COALESCE(?2, is_featured),
                 updated_at = ?3
             WHERE id = ?4
             RETURNING *",
        )
        .bind(is_published)
        .bind(is_featured)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Append stored image paths to a listing's gallery in one statement
    pub async fn add_property_images(&self, id: i64, paths: &[String]) -> sqlx::Result<Option<Property>> {
        if paths.is_empty() {
            return self.find_property(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE properties SET images = json_insert(images");
        for path in paths {
            builder.push(", '$[#]', ").push_bind(path.as_str());
        }
        builder
            .push("), updated_at = ")
            .push_bind(Utc::now())
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING *");

        builder
            .build_query_as::<Property>()
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn owner_stats(&self, user_id: i64) -> sqlx::Result<OwnerStats> {
        sqlx::query_as::<_, OwnerStats>(
            "SELECT COUNT(*) AS properties,
                    COALESCE(SUM(is_published), 0) AS published,
                    COALESCE(SUM(views), 0) AS views,
                    COALESCE(SUM(contacts), 0) AS contacts
             FROM properties WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn site_stats(&self) -> sqlx::Result<SiteStats> {
        sqlx::query_as::<_, SiteStats>(
            "SELECT (SELECT COUNT(*) FROM users) AS users,
                    COUNT(*) AS properties,
                    COALESCE(SUM(is_published), 0) AS published,
                    COALESCE(SUM(is_featured), 0) AS featured,
                    COALESCE(SUM(views), 0) AS views,
                    COALESCE(SUM(contacts), 0) AS contacts
             FROM properties",
        )
        .fetch_one(&self.pool)
        .await
    }
}
