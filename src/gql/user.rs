//! Accounts and the token lifecycle: signUp, login, logout, me,
//! refreshAccessToken, and profile-image upload.

use async_graphql::{Context, InputObject, Object, Result, SimpleObject, Upload};
use axum::http::{HeaderMap, header::SET_COOKIE};
use std::io::Read;
use std::sync::Arc;

use crate::auth::{
    self, REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie,
};
use crate::db::{self, Database};
use crate::jwt::{REFRESH_TOKEN_DURATION_SECS, TokenCodec};
use crate::storage::ImageStore;

use super::CookieOptions;
use super::guard::{self, LoggedInGuard};

#[derive(SimpleObject)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::User> for User {
    fn from(u: db::User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            profile_image: u.profile_image,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(InputObject)]
pub struct SignUpInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(InputObject)]
pub struct LoginInput {
    /// Either the account email or the username
    pub email_or_username: String,
    pub password: String,
}

/// A validation failure tied to a specific input field, so the client can
/// attach the message to the right form control.
#[derive(SimpleObject, Debug)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(SimpleObject)]
pub struct SignUpResponse {
    pub errors: Option<Vec<FieldError>>,
    pub user: Option<User>,
}

#[derive(SimpleObject)]
pub struct LoginResponse {
    pub errors: Option<Vec<FieldError>>,
    pub user: Option<User>,
    pub access_token: Option<String>,
}

#[derive(SimpleObject)]
pub struct RefreshedAccessToken {
    pub access_token: String,
}

const MAX_USERNAME_LENGTH: usize = 32;
const MIN_PASSWORD_LENGTH: usize = 8;

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The current caller's own account.
    #[graphql(guard = "LoggedInGuard")]
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<Database>()?;

        let user = db
            .users()
            .get_by_id(identity.user_id)
            .await
            .map_err(db_error("Failed to load user"))?;
        Ok(user.map(User::from))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Create an account. Validation failures come back as field-level
    /// errors rather than a thrown error, so forms can attach them.
    async fn sign_up(&self, ctx: &Context<'_>, sign_up_input: SignUpInput) -> Result<SignUpResponse> {
        let db = ctx.data::<Database>()?;
        let SignUpInput {
            email,
            username,
            password,
        } = sign_up_input;
        let email = email.trim().to_string();
        let username = username.trim().to_string();

        let mut errors = Vec::new();
        if !is_valid_email(&email) {
            errors.push(FieldError::new("email", "Enter a valid email address."));
        }
        if !is_valid_username(&username) {
            errors.push(FieldError::new(
                "username",
                "Usernames are 1-32 letters, numbers, or underscores.",
            ));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            errors.push(FieldError::new(
                "password",
                "Passwords must be at least 8 characters.",
            ));
        }

        if errors.is_empty() {
            if db
                .users()
                .get_by_email(&email)
                .await
                .map_err(db_error("Failed to check email"))?
                .is_some()
            {
                errors.push(FieldError::new("email", "That email is already in use."));
            }
            if db
                .users()
                .get_by_username(&username)
                .await
                .map_err(db_error("Failed to check username"))?
                .is_some()
            {
                errors.push(FieldError::new(
                    "username",
                    "That username is already taken.",
                ));
            }
        }

        if !errors.is_empty() {
            return Ok(SignUpResponse {
                errors: Some(errors),
                user: None,
            });
        }

        let password_hash = auth::hash_password(&password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            async_graphql::Error::new("Failed to create account")
        })?;

        let id = db
            .users()
            .create(&email, &username, &password_hash)
            .await
            .map_err(db_error("Failed to create user"))?;

        let user = db
            .users()
            .get_by_id(id)
            .await
            .map_err(db_error("Failed to load new user"))?
            .ok_or_else(|| async_graphql::Error::new("Failed to create account"))?;

        Ok(SignUpResponse {
            errors: None,
            user: Some(User::from(user)),
        })
    }

    /// Log in with email or username. On success the response carries the
    /// access token and the refresh token rides in an httpOnly cookie,
    /// mirrored on the user row for revocation.
    async fn login(&self, ctx: &Context<'_>, login_input: LoginInput) -> Result<LoginResponse> {
        let db = ctx.data::<Database>()?;
        let codec = ctx.data::<Arc<TokenCodec>>()?;
        let cookies = ctx.data::<CookieOptions>()?;

        let user = db
            .users()
            .get_by_email_or_username(login_input.email_or_username.trim())
            .await
            .map_err(db_error("Failed to look up user"))?;

        let Some(user) = user else {
            return Ok(LoginResponse {
                errors: Some(vec![FieldError::new(
                    "emailOrUsername",
                    "No matching account found.",
                )]),
                user: None,
                access_token: None,
            });
        };

        if !auth::verify_password(&login_input.password, &user.password_hash) {
            return Ok(LoginResponse {
                errors: Some(vec![FieldError::new("password", "Incorrect password.")]),
                user: None,
                access_token: None,
            });
        }

        let access = codec.issue_access_token(user.id).map_err(token_error)?;
        let refresh = codec.issue_refresh_token(user.id).map_err(token_error)?;

        // Logging in elsewhere invalidates any previously issued refresh token
        db.users()
            .set_refresh_token(user.id, &refresh.token)
            .await
            .map_err(db_error("Failed to store refresh token"))?;

        ctx.append_http_header(
            SET_COOKIE,
            refresh_cookie(&refresh.token, REFRESH_TOKEN_DURATION_SECS, cookies.secure),
        );

        Ok(LoginResponse {
            errors: None,
            user: Some(User::from(user)),
            access_token: Some(access.token),
        })
    }

    /// Log out: overwrite the stored refresh token with the empty marker
    /// and expire the cookie.
    #[graphql(guard = "LoggedInGuard")]
    async fn logout(&self, ctx: &Context<'_>) -> Result<bool> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<Database>()?;
        let cookies = ctx.data::<CookieOptions>()?;

        db.users()
            .clear_refresh_token(identity.user_id)
            .await
            .map_err(db_error("Failed to clear refresh token"))?;

        ctx.append_http_header(SET_COOKIE, clear_refresh_cookie(cookies.secure));
        Ok(true)
    }

    /// Exchange the refresh-token cookie for a new access/refresh pair.
    ///
    /// Every rejection is the expected "not logged in" outcome and comes
    /// back as null, never an error: missing cookie, failed verification,
    /// unknown user, or a stored token that no longer matches (already
    /// rotated, or cleared by logout). On success the refresh token is
    /// rotated, so the presented token is single-use.
    async fn refresh_access_token(
        &self,
        ctx: &Context<'_>,
    ) -> Result<Option<RefreshedAccessToken>> {
        let headers = ctx.data::<HeaderMap>()?;
        let db = ctx.data::<Database>()?;
        let codec = ctx.data::<Arc<TokenCodec>>()?;
        let cookies = ctx.data::<CookieOptions>()?;

        let Some(presented) = get_cookie(headers, REFRESH_COOKIE_NAME) else {
            return Ok(None);
        };
        let Ok(claims) = codec.verify_refresh_token(presented) else {
            return Ok(None);
        };

        let user = db
            .users()
            .get_by_id(claims.sub)
            .await
            .map_err(db_error("Failed to look up user"))?;
        let Some(user) = user else {
            return Ok(None);
        };

        let next = codec.issue_refresh_token(user.id).map_err(token_error)?;

        // Compare-and-swap against the stored value: only the holder of the
        // current token wins, and concurrent renewals cannot both succeed
        let rotated = db
            .users()
            .rotate_refresh_token(user.id, presented, &next.token)
            .await
            .map_err(db_error("Failed to rotate refresh token"))?;
        if !rotated {
            return Ok(None);
        }

        let access = codec.issue_access_token(user.id).map_err(token_error)?;

        ctx.append_http_header(
            SET_COOKIE,
            refresh_cookie(&next.token, REFRESH_TOKEN_DURATION_SECS, cookies.secure),
        );

        Ok(Some(RefreshedAccessToken {
            access_token: access.token,
        }))
    }

    /// Store a new profile image for the caller. Failures are logged
    /// server-side and reported as false; details are not exposed.
    #[graphql(guard = "LoggedInGuard")]
    async fn upload_profile_image(&self, ctx: &Context<'_>, file: Upload) -> Result<bool> {
        let identity = guard::identity(ctx)?;
        let db = ctx.data::<Database>()?;
        let images = ctx.data::<ImageStore>()?;

        let value = match file.value(ctx) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read uploaded file");
                return Ok(false);
            }
        };

        let filename = value.filename.clone();
        let mut content = value.content;
        let mut bytes = Vec::new();
        if let Err(e) = content.read_to_end(&mut bytes) {
            tracing::error!(error = %e, "Failed to read uploaded file");
            return Ok(false);
        }

        let url = match images.save(&filename, &bytes).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, filename = %filename, "Profile image upload failed");
                return Ok(false);
            }
        };

        if let Err(e) = db.users().set_profile_image(identity.user_id, &url).await {
            tracing::error!(error = %e, "Failed to record profile image");
            return Ok(false);
        }

        Ok(true)
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> async_graphql::Error {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        async_graphql::Error::new(context)
    }
}

fn token_error(e: crate::jwt::TokenError) -> async_graphql::Error {
    tracing::error!(error = %e, "Failed to issue token");
    async_graphql::Error::new("Failed to issue token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a@nodot"));
        assert!(!is_valid_email("a@.com"));
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("a"));
        assert!(is_valid_username("alice_42"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("ünïcode"));
        assert!(!is_valid_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)));
    }
}
