//! API client with transparent access-token renewal.
//!
//! Mirrors what the browser app does: a local cache holds the current
//! access token and every call goes out with it attached; the refresh
//! token lives in the http client's cookie store and is never touched
//! directly. When a response signals an expired access token, the client
//! runs the renewal mutation once and replays the original call once.
//! A second expiry on the replay is surfaced, not retried again.
//!
//! Renewals are coalesced: calls that detect expiry while a renewal is
//! already in flight wait for it instead of racing to rotate the refresh
//! token out from under each other.

use serde_json::{Value, json};
use tokio::sync::{Mutex, RwLock};
use url::Url;

use crate::gql::ACCESS_TOKEN_EXPIRED_CODE;

const REFRESH_MUTATION: &str =
    "mutation { refreshAccessToken { accessToken } }";

pub struct ApiClient {
    http: reqwest::Client,
    endpoint: Url,
    /// Current access token, if logged in
    access_token: RwLock<Option<String>>,
    /// Single-flight lock for the renewal mutation
    renewal: Mutex<()>,
}

impl ApiClient {
    /// Create a client for the given GraphQL endpoint.
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            endpoint,
            access_token: RwLock::new(None),
            renewal: Mutex::new(()),
        })
    }

    /// The currently cached access token.
    pub async fn access_token(&self) -> Option<String> {
        self.access_token.read().await.clone()
    }

    /// Replace the cached access token. Exposed so callers (and tests) can
    /// seed the cache, e.g. with a token restored from storage.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// Execute a GraphQL operation, renewing the access token and retrying
    /// once if the server signals that it expired.
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
        let token = self.access_token().await;
        let response = self
            .post(query, &variables, token.as_deref())
            .await
            .map_err(ClientError::Transport)?;

        if !has_expired_signal(&response.errors) {
            return finish(response);
        }

        // Expired: renew once, then replay the original call exactly once
        if self.renew(token.as_deref()).await {
            let token = self.access_token().await;
            let retried = self
                .post(query, &variables, token.as_deref())
                .await
                .map_err(ClientError::Transport)?;
            return finish(retried);
        }

        // Renewal failed: go unauthenticated and surface the original error
        self.set_access_token(None).await;
        Err(ClientError::Graphql(response.errors))
    }

    /// Log in and cache the returned access token. The refresh cookie is
    /// captured by the cookie store automatically.
    pub async fn login(
        &self,
        email_or_username: &str,
        password: &str,
    ) -> Result<Value, ClientError> {
        let data = self
            .execute(
                "mutation Login($loginInput: LoginInput!) {
                    login(loginInput: $loginInput) {
                        errors { field message }
                        user { id username email }
                        accessToken
                    }
                }",
                json!({
                    "loginInput": {
                        "emailOrUsername": email_or_username,
                        "password": password,
                    }
                }),
            )
            .await?;

        let token = data
            .pointer("/login/accessToken")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        self.set_access_token(token).await;
        Ok(data)
    }

    /// Log out and clear the cached access token.
    pub async fn logout(&self) -> Result<Value, ClientError> {
        let result = self.execute("mutation { logout }", Value::Null).await;
        self.set_access_token(None).await;
        result
    }

    /// Run the renewal mutation, coalescing concurrent callers.
    /// `stale` is the token the caller just failed with; if the cache has
    /// already moved past it, another caller's renewal won and no further
    /// request is made. Returns whether a usable token is now cached.
    async fn renew(&self, stale: Option<&str>) -> bool {
        let _guard = self.renewal.lock().await;

        {
            let current = self.access_token.read().await;
            if current.as_deref() != stale {
                return current.is_some();
            }
        }

        // The renewal mutation authenticates via the refresh cookie alone
        match self.post(REFRESH_MUTATION, &Value::Null, None).await {
            Ok(response) => {
                let renewed = response
                    .data
                    .as_ref()
                    .and_then(|d| d.pointer("/refreshAccessToken/accessToken"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());

                let ok = renewed.is_some();
                self.set_access_token(renewed).await;
                ok
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token renewal request failed");
                self.set_access_token(None).await;
                false
            }
        }
    }

    async fn post(
        &self,
        query: &str,
        variables: &Value,
        bearer: Option<&str>,
    ) -> Result<GqlResponse, reqwest::Error> {
        let body = match variables {
            Value::Null => json!({ "query": query }),
            _ => json!({ "query": query, "variables": variables }),
        };

        let mut request = self.http.post(self.endpoint.clone()).json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await?.json::<GqlResponse>().await
    }
}

#[derive(Debug, serde::Deserialize)]
struct GqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

/// An error entry from a GraphQL response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GqlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Value,
}

impl GqlError {
    pub fn code(&self) -> Option<&str> {
        self.extensions.get("code").and_then(|v| v.as_str())
    }
}

fn has_expired_signal(errors: &[GqlError]) -> bool {
    errors
        .iter()
        .any(|e| e.code() == Some(ACCESS_TOKEN_EXPIRED_CODE))
}

fn finish(response: GqlResponse) -> Result<Value, ClientError> {
    if response.errors.is_empty() {
        Ok(response.data.unwrap_or(Value::Null))
    } else {
        Err(ClientError::Graphql(response.errors))
    }
}

#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a GraphQL response
    Transport(reqwest::Error),
    /// The server answered with GraphQL errors
    Graphql(Vec<GqlError>),
}

impl ClientError {
    /// Whether any error entry carries the given extension code.
    pub fn has_code(&self, code: &str) -> bool {
        match self {
            ClientError::Graphql(errors) => errors.iter().any(|e| e.code() == Some(code)),
            ClientError::Transport(_) => false,
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Transport(e) => write!(f, "Request failed: {}", e),
            ClientError::Graphql(errors) => {
                let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
                write!(f, "GraphQL errors: {}", messages.join("; "))
            }
        }
    }
}

impl std::error::Error for ClientError {}
