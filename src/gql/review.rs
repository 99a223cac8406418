//! One text review per (user, cut): upsert, delete, and listing with the
//! caller's own review pinned first.

use async_graphql::{ComplexObject, Context, InputObject, Object, Result, SimpleObject};

use crate::db::{self, Database};

use super::guard::{self, LoggedInGuard};
use super::user::User;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct CutReview {
    pub id: i64,
    /// Review text
    pub contents: String,
    pub cut_id: i32,
    pub created_at: String,
    pub updated_at: String,
    #[graphql(skip)]
    pub user_id: i64,
}

impl From<db::Review> for CutReview {
    fn from(r: db::Review) -> Self {
        Self {
            id: r.id,
            contents: r.contents,
            cut_id: r.cut_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user_id: r.user_id,
        }
    }
}

#[ComplexObject]
impl CutReview {
    /// The review's author.
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let db = ctx.data::<Database>()?;
        let user = db.users().get_by_id(self.user_id).await.map_err(|e| {
            tracing::error!(error = %e, user_id = self.user_id, "Failed to load review author");
            async_graphql::Error::new("Failed to load review author")
        })?;
        user.map(User::from)
            .ok_or_else(|| "Review author no longer exists".into())
    }

    /// Whether the review belongs to the current caller.
    async fn is_mine(&self, ctx: &Context<'_>) -> bool {
        guard::identity(ctx)
            .map(|identity| identity.user_id == self.user_id)
            .unwrap_or(false)
    }
}

#[derive(InputObject)]
pub struct CreateOrUpdateCutReviewInput {
    pub cut_id: i32,
    /// Review text
    pub contents: String,
}

#[derive(Default)]
pub struct ReviewQuery;

#[Object]
impl ReviewQuery {
    /// Reviews for a cut, newest first. When the caller has reviewed the
    /// cut themselves, their review is pinned to the front and the rest of
    /// the page is capped at one entry.
    async fn cut_reviews(
        &self,
        ctx: &Context<'_>,
        cut_id: i32,
        #[graphql(default = 2)] take: i32,
        skip: Option<i32>,
    ) -> Result<Vec<CutReview>> {
        let db = ctx.data::<Database>()?;
        let skip = i64::from(skip.unwrap_or(0).max(0));
        let take = i64::from(take.max(0));

        let own = match guard::identity(ctx) {
            Ok(identity) => db
                .reviews()
                .get_by_user_and_cut(identity.user_id, cut_id)
                .await
                .map_err(list_error)?,
            Err(_) => None,
        };

        match own {
            Some(own) => {
                let take = take.min(1);
                let others = db
                    .reviews()
                    .list_for_cut(cut_id, take, skip, Some(own.id))
                    .await
                    .map_err(list_error)?;

                let mut reviews = vec![CutReview::from(own)];
                reviews.extend(others.into_iter().map(CutReview::from));
                Ok(reviews)
            }
            None => {
                let reviews = db
                    .reviews()
                    .list_for_cut(cut_id, take, skip, None)
                    .await
                    .map_err(list_error)?;
                Ok(reviews.into_iter().map(CutReview::from).collect())
            }
        }
    }
}

fn list_error(e: sqlx::Error) -> async_graphql::Error {
    tracing::error!(error = %e, "Failed to list reviews");
    async_graphql::Error::new("Failed to list reviews")
}

#[derive(Default)]
pub struct ReviewMutation;

#[Object]
impl ReviewMutation {
    /// Create the caller's review for a cut, or replace its text if one
    /// already exists.
    #[graphql(guard = "LoggedInGuard")]
    async fn create_or_update_cut_review(
        &self,
        ctx: &Context<'_>,
        cut_review_input: CreateOrUpdateCutReviewInput,
    ) -> Result<CutReview> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<Database>()?;

        let review = db
            .reviews()
            .upsert(
                identity.user_id,
                cut_review_input.cut_id,
                &cut_review_input.contents,
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to save review");
                async_graphql::Error::new("Failed to save review")
            })?;
        Ok(CutReview::from(review))
    }

    /// Delete one of the caller's reviews. Returns false when the review
    /// does not exist or belongs to someone else.
    #[graphql(guard = "LoggedInGuard")]
    async fn delete_review(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<Database>()?;

        db.reviews()
            .delete_owned(id, identity.user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, review_id = id, "Failed to delete review");
                async_graphql::Error::new("Failed to delete review")
            })
    }
}
