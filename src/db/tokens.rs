use chrono::{DateTime, Utc};

use super::Database;
use crate::models::PasswordReset;

impl Database {
    /// Store the (hashed) reset token for an email, replacing any earlier one
    pub async fn store_reset_token(&self, email: &str, token_hash: &str) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO password_resets (email, token_hash, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO UPDATE SET token_hash = excluded.token_hash, created_at = excluded.created_at",
        )
        .bind(email)
        .bind(token_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_reset_token(&self, email: &str) -> sqlx::Result<Option<PasswordReset>> {
        sqlx::query_as::<_, PasswordReset>("SELECT * FROM password_resets WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn delete_reset_token(&self, email: &str) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM password_resets WHERE email = ?1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Drop reset tokens issued before `cutoff`
    pub async fn prune_reset_tokens(&self, cutoff: DateTime<Utc>) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM password_resets WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
