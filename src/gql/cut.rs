//! Cut queries, the vote toggle, and the per-cut vote fields.

use async_graphql::dataloader::DataLoader;
use async_graphql::{ComplexObject, Context, Object, Result, SimpleObject};
use std::sync::Arc;

use crate::catalog::{self, Catalog};

use super::film::Film;
use super::guard::{self, LoggedInGuard};
use super::loader::CutVoteLoader;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct Cut {
    pub id: i32,
    /// Image URL of the scene
    pub src: String,
    pub film_id: i32,
}

impl From<&catalog::Cut> for Cut {
    fn from(c: &catalog::Cut) -> Self {
        Self {
            id: c.id,
            src: c.src.clone(),
            film_id: c.film_id,
        }
    }
}

#[ComplexObject]
impl Cut {
    async fn film(&self, ctx: &Context<'_>) -> Result<Option<Film>> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        Ok(catalog.film(self.film_id).map(Film::from))
    }

    /// Number of likes on this cut.
    async fn votes_count(&self, ctx: &Context<'_>) -> Result<i32> {
        let loader = ctx.data::<DataLoader<CutVoteLoader>>()?;
        let votes = loader.load_one(self.id).await?.unwrap_or_default();
        Ok(votes.len() as i32)
    }

    /// Whether the current caller has liked this cut. Always false for
    /// anonymous requests.
    async fn is_voted(&self, ctx: &Context<'_>) -> Result<bool> {
        let Ok(identity) = guard::identity(ctx) else {
            return Ok(false);
        };
        let loader = ctx.data::<DataLoader<CutVoteLoader>>()?;
        let votes = loader.load_one(self.id).await?.unwrap_or_default();
        Ok(votes.iter().any(|v| v.user_id == identity.user_id))
    }
}

#[derive(Default)]
pub struct CutQuery;

#[Object]
impl CutQuery {
    async fn cuts(&self, ctx: &Context<'_>, film_id: i32) -> Result<Vec<Cut>> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        Ok(catalog
            .cuts_for_film(film_id)
            .into_iter()
            .map(Cut::from)
            .collect())
    }

    async fn cut(&self, ctx: &Context<'_>, cut_id: i32) -> Result<Option<Cut>> {
        let catalog = ctx.data::<Arc<Catalog>>()?;
        Ok(catalog.cut(cut_id).map(Cut::from))
    }
}

#[derive(Default)]
pub struct CutMutation;

#[Object]
impl CutMutation {
    /// Toggle the caller's like on a cut: first call votes, second call
    /// removes the vote.
    #[graphql(guard = "LoggedInGuard")]
    async fn vote(&self, ctx: &Context<'_>, cut_id: i32) -> Result<bool> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<crate::db::Database>()?;

        db.votes()
            .toggle(identity.user_id, cut_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, cut_id, "Failed to toggle vote");
                async_graphql::Error::new("Failed to register vote")
            })?;
        Ok(true)
    }
}
