//! Guard for operations that require an authenticated caller.

use async_graphql::{Context, Error, ErrorExtensions, Guard, Result};

use crate::auth::{AuthState, Identity};

/// Machine-readable code telling clients to run the renewal flow.
pub const ACCESS_TOKEN_EXPIRED_CODE: &str = "ACCESS_TOKEN_EXPIRED";

/// Machine-readable code for anonymous access to a guarded operation.
pub const UNAUTHENTICATED_CODE: &str = "UNAUTHENTICATED";

/// Rejects anonymous requests before the guarded resolver runs.
///
/// An expired access token gets its own error code so the client retry
/// interceptor can renew and replay instead of forcing a re-login.
pub struct LoggedInGuard;

impl Guard for LoggedInGuard {
    async fn check(&self, ctx: &Context<'_>) -> Result<()> {
        match ctx.data::<AuthState>()? {
            AuthState::Verified(_) => Ok(()),
            AuthState::Expired => Err(expired_error()),
            AuthState::Anonymous => Err(unauthenticated_error()),
        }
    }
}

/// The caller's identity. Resolvers behind [`LoggedInGuard`] can rely on
/// this succeeding; elsewhere it yields the same rejection the guard would.
pub fn identity(ctx: &Context<'_>) -> Result<Identity> {
    match ctx.data::<AuthState>()? {
        AuthState::Verified(identity) => Ok(*identity),
        AuthState::Expired => Err(expired_error()),
        AuthState::Anonymous => Err(unauthenticated_error()),
    }
}

pub fn expired_error() -> Error {
    Error::new("Access token expired")
        .extend_with(|_, e| e.set("code", ACCESS_TOKEN_EXPIRED_CODE))
}

pub fn unauthenticated_error() -> Error {
    Error::new("Not logged in").extend_with(|_, e| e.set("code", UNAUTHENTICATED_CODE))
}
