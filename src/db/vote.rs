//! Toggleable likes on cuts.

use sqlx::sqlite::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Vote {
    pub user_id: i64,
    pub cut_id: i32,
}

#[derive(Clone)]
pub struct VoteStore {
    pool: SqlitePool,
}

impl VoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Toggle the (user, cut) vote. Returns true when the vote now exists,
    /// false when the toggle removed it.
    pub async fn toggle(&self, user_id: i64, cut_id: i32) -> Result<bool, sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM cut_votes WHERE user_id = ? AND cut_id = ?")
            .bind(user_id)
            .bind(cut_id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO cut_votes (user_id, cut_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(cut_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Count votes for a single cut.
    pub async fn count_for_cut(&self, cut_id: i32) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cut_votes WHERE cut_id = ?")
            .bind(cut_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    /// Fetch all votes for a set of cuts in one round trip, for batched
    /// field resolution.
    pub async fn list_for_cuts(&self, cut_ids: &[i32]) -> Result<Vec<Vote>, sqlx::Error> {
        if cut_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; cut_ids.len()].join(", ");
        let sql = format!(
            "SELECT user_id, cut_id FROM cut_votes WHERE cut_id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as(&sql);
        for cut_id in cut_ids {
            query = query.bind(cut_id);
        }
        query.fetch_all(&self.pool).await
    }
}
