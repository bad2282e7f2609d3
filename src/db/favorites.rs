use std::collections::HashSet;

use chrono::Utc;

use super::Database;
use crate::models::{offset, Paginated, Property};

impl Database {
    /// Returns true when a new favorite row was written
    pub async fn add_favorite(&self, user_id: i64, property_id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO favorites (user_id, property_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(user_id)
        .bind(property_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns true when a favorite row was removed
    pub async fn remove_favorite(&self, user_id: i64, property_id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = ?1 AND property_id = ?2")
            .bind(user_id)
            .bind(property_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the favorite and return the new state
    pub async fn toggle_favorite(&self, user_id: i64, property_id: i64) -> sqlx::Result<bool> {
        if self.remove_favorite(user_id, property_id).await? {
            Ok(false)
        } else {
            self.add_favorite(user_id, property_id).await?;
            Ok(true)
        }
    }

    pub async fn is_favorited(&self, user_id: i64, property_id: i64) -> sqlx::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorites WHERE user_id = ?1 AND property_id = ?2",
        )
        .bind(user_id)
        .bind(property_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Every property id the user has favorited, for marking cards
    pub async fn favorite_ids(&self, user_id: i64) -> sqlx::Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT property_id FROM favorites WHERE user_id = ?1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// How many users favorited a listing
    pub async fn favorite_count(&self, property_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE property_id = ?1")
            .bind(property_id)
            .fetch_one(&self.pool)
            .await
    }

    /// How many listings a user favorited
    pub async fn user_favorite_count(&self, user_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Published favorites, most recently saved first
    pub async fn list_favorites(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> sqlx::Result<Paginated<Property>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM favorites f JOIN properties p ON p.id = f.property_id
             WHERE f.user_id = ?1 AND p.is_published = 1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let properties = sqlx::query_as::<_, Property>(
            "SELECT p.* FROM favorites f JOIN properties p ON p.id = f.property_id
             WHERE f.user_id = ?1 AND p.is_published = 1
             ORDER BY f.created_at DESC, p.id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(user_id)
        .bind(per_page as i64)
        .bind(offset(page, per_page))
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(properties, page, per_page, total))
    }
}
