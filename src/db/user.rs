//! User accounts, including the per-account refresh-token session slot.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Single active refresh token for the account. None until first login,
    /// '' after logout (the empty marker never matches a signed token).
    pub refresh_token: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const USER_COLUMNS: &str =
    "id, email, username, password_hash, refresh_token, profile_image, created_at, updated_at";

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. Returns the user id.
    pub async fn create(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (email, username, password_hash) VALUES (?, ?, ?)")
                .bind(email)
                .bind(username)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get a user by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get a user by whichever of email or username matches.
    pub async fn get_by_email_or_username(
        &self,
        email_or_username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = ? OR username = ?",
            USER_COLUMNS
        ))
        .bind(email_or_username)
        .bind(email_or_username)
        .fetch_optional(&self.pool)
        .await
    }

    /// Store the current refresh token for a user (login).
    pub async fn set_refresh_token(&self, id: i64, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the stored refresh token, but only if the stored value still
    /// equals `presented`. A conditional update rather than read-then-write,
    /// so concurrent renewals cannot both succeed with the same token.
    /// Returns whether the swap happened.
    pub async fn rotate_refresh_token(
        &self,
        id: i64,
        presented: &str,
        next: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ? AND refresh_token = ?")
                .bind(next)
                .bind(id)
                .bind(presented)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Overwrite the stored refresh token with the empty marker (logout).
    pub async fn clear_refresh_token(&self, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = '' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record the public URL of the user's profile image.
    pub async fn set_profile_image(&self, id: i64, url: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET profile_image = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(url)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
