//! Per-request access-token verification.

use axum::http::{HeaderMap, header};

use crate::jwt::{TokenCodec, TokenError};

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
}

/// Outcome of inspecting a request's Authorization header.
///
/// An absent or malformed credential is an anonymous request, not an
/// error; operations that require identity reject it themselves. An
/// expired token is kept distinct because it is the signal that tells
/// clients to run the renewal flow instead of re-authenticating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Verified(Identity),
    Expired,
}

impl AuthState {
    pub fn identity(&self) -> Option<Identity> {
        match self {
            AuthState::Verified(identity) => Some(*identity),
            _ => None,
        }
    }
}

/// Verify the `Authorization: Bearer <token>` header, if present.
/// Pure: no side effects, no caching across requests.
pub fn authenticate(headers: &HeaderMap, codec: &TokenCodec) -> AuthState {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return AuthState::Anonymous;
    };
    let Ok(value) = value.to_str() else {
        return AuthState::Anonymous;
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return AuthState::Anonymous;
    };
    let token = token.trim();
    if token.is_empty() {
        return AuthState::Anonymous;
    }

    match codec.verify_access_token(token) {
        Ok(claims) => AuthState::Verified(Identity {
            user_id: claims.sub,
        }),
        Err(TokenError::Expired) => AuthState::Expired,
        Err(_) => AuthState::Anonymous,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::{Claims, TokenSecrets, TokenType};
    use axum::http::HeaderValue;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn codec() -> TokenCodec {
        TokenCodec::new(&TokenSecrets {
            access: "gate-test-access-secret".to_string(),
            refresh: "gate-test-refresh-secret".to_string(),
        })
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_no_header_is_anonymous() {
        assert_eq!(
            authenticate(&HeaderMap::new(), &codec()),
            AuthState::Anonymous
        );
    }

    #[test]
    fn test_valid_token_is_verified() {
        let codec = codec();
        let token = codec.issue_access_token(7).unwrap();

        let state = authenticate(&bearer(&token.token), &codec);
        assert_eq!(state.identity(), Some(Identity { user_id: 7 }));
    }

    #[test]
    fn test_malformed_token_is_anonymous() {
        assert_eq!(
            authenticate(&bearer("garbage"), &codec()),
            AuthState::Anonymous
        );
    }

    #[test]
    fn test_missing_bearer_prefix_is_anonymous() {
        let codec = codec();
        let token = codec.issue_access_token(7).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&token.token).unwrap(),
        );
        assert_eq!(authenticate(&headers, &codec), AuthState::Anonymous);
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let secrets = TokenSecrets {
            access: "gate-test-access-secret".to_string(),
            refresh: "gate-test-refresh-secret".to_string(),
        };
        let codec = TokenCodec::new(&secrets);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: 7,
            token_type: TokenType::Access,
            iat: now - 120,
            exp: now - 60,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(secrets.access.as_bytes()),
        )
        .unwrap();

        assert_eq!(authenticate(&bearer(&token), &codec), AuthState::Expired);
    }

    #[test]
    fn test_refresh_token_in_header_is_anonymous() {
        // A refresh token is not an access credential
        let codec = codec();
        let refresh = codec.issue_refresh_token(7).unwrap();
        assert_eq!(
            authenticate(&bearer(&refresh.token), &codec),
            AuthState::Anonymous
        );
    }
}
