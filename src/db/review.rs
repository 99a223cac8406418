//! Text reviews on cuts, at most one per (user, cut).

use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub cut_id: i32,
    pub contents: String,
    pub created_at: String,
    pub updated_at: String,
}

const REVIEW_COLUMNS: &str = "id, user_id, cut_id, contents, created_at, updated_at";

#[derive(Clone)]
pub struct ReviewStore {
    pool: SqlitePool,
}

impl ReviewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the user's review for a cut, or replace its contents if one
    /// already exists. Returns the resulting row.
    pub async fn upsert(
        &self,
        user_id: i64,
        cut_id: i32,
        contents: &str,
    ) -> Result<Review, sqlx::Error> {
        sqlx::query(
            "INSERT INTO cut_reviews (user_id, cut_id, contents) VALUES (?, ?, ?)
             ON CONFLICT (user_id, cut_id)
             DO UPDATE SET contents = excluded.contents, updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(cut_id)
        .bind(contents)
        .execute(&self.pool)
        .await?;

        sqlx::query_as(&format!(
            "SELECT {} FROM cut_reviews WHERE user_id = ? AND cut_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(cut_id)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a user's review for a cut, if any.
    pub async fn get_by_user_and_cut(
        &self,
        user_id: i64,
        cut_id: i32,
    ) -> Result<Option<Review>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {} FROM cut_reviews WHERE user_id = ? AND cut_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(cut_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete a review, but only if it belongs to `user_id`.
    /// Returns whether a row was removed.
    pub async fn delete_owned(&self, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cut_reviews WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List reviews for a cut, newest first, optionally excluding one row
    /// (the caller's own review, which is surfaced separately).
    pub async fn list_for_cut(
        &self,
        cut_id: i32,
        take: i64,
        skip: i64,
        exclude_id: Option<i64>,
    ) -> Result<Vec<Review>, sqlx::Error> {
        match exclude_id {
            Some(exclude) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM cut_reviews WHERE cut_id = ? AND id != ?
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    REVIEW_COLUMNS
                ))
                .bind(cut_id)
                .bind(exclude)
                .bind(take)
                .bind(skip)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM cut_reviews WHERE cut_id = ?
                     ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
                    REVIEW_COLUMNS
                ))
                .bind(cut_id)
                .bind(take)
                .bind(skip)
                .fetch_all(&self.pool)
                .await
            }
        }
    }
}
