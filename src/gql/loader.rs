//! Batched vote lookups.
//!
//! `votesCount` and `isVoted` are resolved per cut; rendering a page of
//! cuts would otherwise issue one vote query per cut. The loader collects
//! the cut ids seen during one request and fetches their votes in a single
//! round trip. A fresh loader is attached per request, so nothing is
//! cached across requests.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::{Database, Vote};

pub struct CutVoteLoader {
    db: Database,
}

impl CutVoteLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i32> for CutVoteLoader {
    type Value = Vec<Vote>;
    type Error = Arc<sqlx::Error>;

    async fn load(&self, keys: &[i32]) -> Result<HashMap<i32, Self::Value>, Self::Error> {
        let votes = self.db.votes().list_for_cuts(keys).await.map_err(Arc::new)?;

        let mut grouped: HashMap<i32, Vec<Vote>> = HashMap::new();
        for vote in votes {
            grouped.entry(vote.cut_id).or_default().push(vote);
        }
        // Cuts with no votes are simply absent; callers treat that as empty
        Ok(grouped)
    }
}
