use chrono::Utc;

use super::Database;
use crate::models::{offset, Paginated, ProfileUpdate, Role, User};

/// Fields needed to insert a user row
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: Role,
    pub verification_token: Option<String>,
}

impl Database {
    pub async fn create_user(&self, new_user: &NewUser) -> sqlx::Result<User> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, phone, role, verification_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING *",
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.phone)
        .bind(new_user.role)
        .bind(&new_user.verification_token)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_user(&self, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Case-insensitive lookup
    pub async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    /// Whether another account already uses `email`
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> sqlx::Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2")
                .bind(email)
                .bind(except_id.unwrap_or(0))
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Save profile fields. A changed email drops verification and stores the new token.
    pub async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
        reverify_token: Option<&str>,
    ) -> sqlx::Result<User> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE users SET name = ?1, email = ?2, phone = ?3, address = ?4, locale = ?5,
                 facebook = ?6, twitter = ?7, instagram = ?8, linkedin = ?9, updated_at = ?10
             WHERE id = ?11",
        )
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(&update.locale)
        .bind(&update.facebook)
        .bind(&update.twitter)
        .bind(&update.instagram)
        .bind(&update.linkedin)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(token) = reverify_token {
            sqlx::query(
                "UPDATE users SET email_verified_at = NULL, verification_token = ?1 WHERE id = ?2",
            )
            .bind(token)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_photo(&self, id: i64, photo_path: Option<&str>) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET photo_path = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(photo_path)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns false when no such user exists
    pub async fn set_role(&self, id: i64, role: Role) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(role)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_verification_token(&self, id: i64, token: &str) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET verification_token = ?1 WHERE id = ?2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stamp verification (keeping an earlier stamp) and burn the token
    pub async fn mark_email_verified(&self, id: i64) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users SET email_verified_at = COALESCE(email_verified_at, ?1), verification_token = NULL
             WHERE id = ?2",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a user and, through foreign keys, everything they own
    pub async fn delete_user(&self, id: i64) -> sqlx::Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_resets WHERE email = (SELECT email FROM users WHERE id = ?1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn user_count(&self) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    /// Newest first
    pub async fn list_users(&self, page: u32, per_page: u32) -> sqlx::Result<Paginated<User>> {
        let total = self.user_count().await?;
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )
        .bind(per_page as i64)
        .bind(offset(page, per_page))
        .fetch_all(&self.pool)
        .await?;

        Ok(Paginated::new(users, page, per_page, total))
    }

    pub async fn recent_users(&self, limit: i64) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}
