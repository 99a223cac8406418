#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use filmcuts::db::Database;
use filmcuts::jwt::{Claims, TokenCodec, TokenSecrets, TokenType};
use filmcuts::{ServerConfig, create_app};
use serde_json::{Value, json};
use tower::ServiceExt;

pub const ACCESS_SECRET: &str = "test-access-secret-for-testing";
pub const REFRESH_SECRET: &str = "test-refresh-secret-for-testing";

pub fn test_secrets() -> TokenSecrets {
    TokenSecrets {
        access: ACCESS_SECRET.to_string(),
        refresh: REFRESH_SECRET.to_string(),
    }
}

pub fn test_uploads_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("filmcuts-tests-{}", uuid::Uuid::new_v4()))
}

pub fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        secrets: test_secrets(),
        secure_cookies: false,
        uploads_dir: test_uploads_dir(),
    }
}

/// Create a test app and return (app, db, codec).
pub async fn create_test_app() -> (Router, Database, TokenCodec) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = test_config(db.clone());
    (create_app(&config), db, TokenCodec::new(&test_secrets()))
}

/// Options for a GraphQL request.
#[derive(Default)]
pub struct GqlRequest<'a> {
    pub bearer: Option<&'a str>,
    pub cookie: Option<&'a str>,
}

/// Execute a GraphQL operation against the router and return the raw
/// http response.
pub async fn gql_raw(
    app: &Router,
    query: &str,
    variables: Value,
    opts: GqlRequest<'_>,
) -> Response<Body> {
    let body = match &variables {
        Value::Null => json!({ "query": query }),
        _ => json!({ "query": query, "variables": variables }),
    };

    let mut builder = Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = opts.bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    if let Some(cookie) = opts.cookie {
        builder = builder.header(header::COOKIE, format!("refreshtoken={}", cookie));
    }

    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Execute a GraphQL operation and return the parsed response body.
pub async fn gql(app: &Router, query: &str, variables: Value, opts: GqlRequest<'_>) -> Value {
    let response = gql_raw(app, query, variables, opts).await;
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Extract the refreshtoken cookie value from a response's Set-Cookie
/// headers. An empty value (the cleared cookie) comes back as Some("").
pub fn refresh_cookie_value(response: &Response<Body>) -> Option<String> {
    for value in response.headers().get_all(header::SET_COOKIE) {
        let value = value.to_str().ok()?;
        let pair = value.split(';').next()?;
        if let Some((name, token)) = pair.split_once('=') {
            if name.trim() == "refreshtoken" {
                return Some(token.trim().to_string());
            }
        }
    }
    None
}

/// Sign up a user and return their id.
pub async fn sign_up(app: &Router, email: &str, username: &str, password: &str) -> i64 {
    let body = gql(
        app,
        "mutation SignUp($signUpInput: SignUpInput!) {
            signUp(signUpInput: $signUpInput) {
                errors { field message }
                user { id email username }
            }
        }",
        json!({
            "signUpInput": { "email": email, "username": username, "password": password }
        }),
        GqlRequest::default(),
    )
    .await;

    assert!(
        body["data"]["signUp"]["errors"].is_null(),
        "unexpected signUp errors: {}",
        body
    );
    body["data"]["signUp"]["user"]["id"].as_i64().unwrap()
}

/// Log in and return (access token, refresh cookie value).
pub async fn login(app: &Router, email_or_username: &str, password: &str) -> (String, String) {
    let response = gql_raw(
        app,
        "mutation Login($loginInput: LoginInput!) {
            login(loginInput: $loginInput) {
                errors { field message }
                accessToken
            }
        }",
        json!({
            "loginInput": { "emailOrUsername": email_or_username, "password": password }
        }),
        GqlRequest::default(),
    )
    .await;

    let cookie = refresh_cookie_value(&response).expect("login should set the refresh cookie");
    let body = read_json(response).await;
    let token = body["data"]["login"]["accessToken"]
        .as_str()
        .unwrap_or_else(|| panic!("login failed: {}", body))
        .to_string();
    (token, cookie)
}

/// Craft an access token whose validity window has already elapsed.
pub fn expired_access_token(user_id: i64) -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let claims = Claims {
        sub: user_id,
        token_type: TokenType::Access,
        iat: now - 120,
        exp: now - 60,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Collect the extension codes of all errors in a response body.
pub fn error_codes(body: &Value) -> Vec<String> {
    body["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.pointer("/extensions/code"))
                .filter_map(|c| c.as_str())
                .map(|c| c.to_string())
                .collect()
        })
        .unwrap_or_default()
}
