//! JWT token generation and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived access token (30 minutes) - stateless
    Access,
    /// Long-lived refresh token (2 weeks) - current value stored on the user row
    Refresh,
}

/// JWT claims shared by both token kinds. Carries only the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: i64,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Access token duration: 30 minutes
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 30 * 60;

/// Refresh token duration: 2 weeks
pub const REFRESH_TOKEN_DURATION_SECS: u64 = 14 * 24 * 60 * 60;

/// Signing secrets, one per token kind. Access and refresh tokens must not
/// be interchangeable even if a claims payload leaks across kinds.
#[derive(Debug, Clone)]
pub struct TokenSecrets {
    pub access: String,
    pub refresh: String,
}

impl TokenSecrets {
    /// Fallback used when no secret is configured. Trivially forgeable;
    /// the server warns at startup whenever this value is in use.
    pub const DEFAULT: &'static str = "secret-key";

    pub fn uses_default(&self) -> bool {
        self.access == Self::DEFAULT || self.refresh == Self::DEFAULT
    }
}

/// Result of generating a token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The JWT token string
    pub token: String,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Codec for both token kinds. Construct once with explicit secrets and
/// share behind an `Arc`; signing and verification are pure functions of
/// the configuration, with no ambient state.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenCodec {
    pub fn new(secrets: &TokenSecrets) -> Self {
        Self {
            access: KeyPair::new(secrets.access.as_bytes()),
            refresh: KeyPair::new(secrets.refresh.as_bytes()),
        }
    }

    /// Generate an access token for a user. No side effects.
    pub fn issue_access_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        issue(
            &self.access.encoding,
            user_id,
            TokenType::Access,
            ACCESS_TOKEN_DURATION_SECS,
        )
    }

    /// Generate a refresh token for a user. The caller is responsible for
    /// persisting it on the user row; the codec itself is stateless.
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<IssuedToken, TokenError> {
        issue(
            &self.refresh.encoding,
            user_id,
            TokenType::Refresh,
            REFRESH_TOKEN_DURATION_SECS,
        )
    }

    /// Validate and decode an access token.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        verify(&self.access.decoding, token, TokenType::Access)
    }

    /// Validate and decode a refresh token.
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        verify(&self.refresh.decoding, token, TokenType::Refresh)
    }
}

fn issue(
    key: &EncodingKey,
    user_id: i64,
    token_type: TokenType,
    duration: u64,
) -> Result<IssuedToken, TokenError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::TimeError)?
        .as_secs();
    let exp = now + duration;

    let claims = Claims {
        sub: user_id,
        token_type,
        iat: now,
        exp,
    };

    let token =
        jsonwebtoken::encode(&Header::default(), &claims, key).map_err(TokenError::Encoding)?;

    Ok(IssuedToken {
        token,
        expires_at: exp,
        duration,
    })
}

fn verify(key: &DecodingKey, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let token_data =
        jsonwebtoken::decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        })?;

    if token_data.claims.token_type != expected {
        return Err(TokenError::WrongTokenType);
    }

    Ok(token_data.claims)
}

/// Errors that can occur during token operations.
///
/// `Expired` is kept separate from `Invalid` so the auth gate can surface
/// the renewal signal to clients while treating malformed tokens as
/// anonymous requests.
#[derive(Debug)]
pub enum TokenError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Signature or structural check failed
    Invalid(jsonwebtoken::errors::Error),
    /// Token was well-formed but its validity window has elapsed
    Expired,
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
}

impl TokenError {
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::Expired)
    }
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            TokenError::Invalid(e) => write!(f, "Invalid token: {}", e),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::TimeError => write!(f, "System time error"),
            TokenError::WrongTokenType => write!(f, "Wrong token type"),
        }
    }
}

impl std::error::Error for TokenError {}
