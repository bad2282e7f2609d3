use chrono::{Duration, Utc};

use super::Database;
use crate::models::Session;
use crate::security::generate_token;

impl Database {
    /// Start a session lasting `lifetime`
    pub async fn create_session(&self, user_id: i64, lifetime: Duration) -> sqlx::Result<Session> {
        let now = Utc::now();
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (token, user_id, expires_at, created_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING *",
        )
        .bind(generate_token())
        .bind(user_id)
        .bind(now + lifetime)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Unexpired session for a token
    pub async fn find_session(&self, token: &str) -> sqlx::Result<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = ?1 AND expires_at > ?2")
            .bind(token)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn touch_session(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("UPDATE sessions SET last_seen_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn confirm_session_password(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("UPDATE sessions SET password_confirmed_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the pending one-time message
    pub async fn set_flash(&self, id: i64, message: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE sessions SET flash = ?1 WHERE id = ?2")
            .bind(message)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Read and clear the pending one-time message
    pub async fn take_flash(&self, id: i64) -> sqlx::Result<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let flash = sqlx::query_scalar::<_, Option<String>>("SELECT flash FROM sessions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .flatten();

        if flash.is_some() {
            sqlx::query("UPDATE sessions SET flash = NULL WHERE id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(flash)
    }

    pub async fn delete_session(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sign a user out everywhere, optionally keeping one session
    pub async fn delete_user_sessions(&self, user_id: i64, keep: Option<i64>) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?1 AND id != ?2")
            .bind(user_id)
            .bind(keep.unwrap_or(0))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn prune_expired_sessions(&self) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
