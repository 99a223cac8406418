//! GraphQL schema.
//!
//! One query/mutation object per entity, merged into the roots, with field
//! resolvers written out explicitly. Request-scoped state (auth outcome,
//! vote loader, request headers) is attached to each request by the axum
//! handler in `lib.rs`; process-wide state (database, codec, catalog,
//! image store) lives in the schema data.

mod cut;
mod film;
mod guard;
mod loader;
mod review;
mod user;

use async_graphql::{EmptySubscription, MergedObject, Schema};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::db::Database;
use crate::jwt::TokenCodec;
use crate::storage::ImageStore;

pub use guard::{ACCESS_TOKEN_EXPIRED_CODE, UNAUTHENTICATED_CODE};
pub use loader::CutVoteLoader;

/// Cookie behavior injected at schema build time.
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    /// Set the Secure attribute (https deployments).
    pub secure: bool,
}

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    film::FilmQuery,
    cut::CutQuery,
    review::ReviewQuery,
    user::UserQuery,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(user::UserMutation, cut::CutMutation, review::ReviewMutation);

pub type FilmcutsSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(
    db: Database,
    codec: Arc<TokenCodec>,
    catalog: Arc<Catalog>,
    images: ImageStore,
    cookies: CookieOptions,
) -> FilmcutsSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(db)
    .data(codec)
    .data(catalog)
    .data(images)
    .data(cookies)
    .finish()
}
