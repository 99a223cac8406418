//! Request authentication.
//!
//! Dual-token system: short-lived access tokens (30 minutes, stateless,
//! carried in the Authorization header) and long-lived refresh tokens
//! (2 weeks, carried in an httpOnly cookie and mirrored on the user row
//! for revocation). Each request is verified independently; nothing is
//! cached between requests.

mod cookie;
mod gate;
mod password;

pub use cookie::{REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie};
pub use gate::{AuthState, Identity, authenticate};
pub use password::{hash_password, verify_password};
