use std::collections::BTreeMap;

use chrono::Utc;

use super::Database;
use crate::models::SiteSettings;

impl Database {
    pub async fn all_settings(&self) -> sqlx::Result<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Upsert several settings atomically
    pub async fn set_settings(&self, values: &[(String, String)]) -> sqlx::Result<()> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for (key, value) in values {
            sqlx::query(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }

    /// Typed settings; the site name falls back to `default_site_name`
    pub async fn site_settings(&self, default_site_name: &str) -> sqlx::Result<SiteSettings> {
        let mut settings = SiteSettings {
            site_name: default_site_name.to_string(),
            ..Default::default()
        };
        for (key, value) in self.all_settings().await? {
            settings.set(&key, value);
        }
        Ok(settings)
    }
}
