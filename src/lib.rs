pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod db;
pub mod gql;
pub mod jwt;
pub mod storage;

use async_graphql::dataloader::DataLoader;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse},
    routing::get,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use catalog::Catalog;
use db::Database;
use gql::{CookieOptions, CutVoteLoader, FilmcutsSchema};
use jwt::{TokenCodec, TokenSecrets};
use storage::ImageStore;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Signing secrets, one per token kind
    pub secrets: TokenSecrets,
    /// Whether to set the Secure flag on the refresh cookie (https deployments)
    pub secure_cookies: bool,
    /// Directory profile images are written to
    pub uploads_dir: PathBuf,
}

#[derive(Clone)]
struct AppState {
    schema: FilmcutsSchema,
    codec: Arc<TokenCodec>,
    db: Database,
    images: ImageStore,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let codec = Arc::new(TokenCodec::new(&config.secrets));
    let catalog = Arc::new(Catalog::new());
    let images = ImageStore::new(&config.uploads_dir);

    let schema = gql::build_schema(
        config.db.clone(),
        codec.clone(),
        catalog,
        images.clone(),
        CookieOptions {
            secure: config.secure_cookies,
        },
    );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/uploads/{name}", get(serve_upload))
        .with_state(AppState {
            schema,
            codec,
            db: config.db.clone(),
            images,
        })
}

/// Execute a GraphQL request.
///
/// Authentication happens here, once per request: the outcome is attached
/// to the request data for the guard and resolvers, along with a fresh
/// vote loader and the raw headers (the renewal mutation reads its cookie
/// from them).
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let auth_state = auth::authenticate(&headers, &state.codec);
    let loader = DataLoader::new(CutVoteLoader::new(state.db.clone()), tokio::spawn);

    let request = req
        .into_inner()
        .data(auth_state)
        .data(loader)
        .data(headers);

    state.schema.execute(request).await.into()
}

/// Serve the interactive GraphQL IDE.
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// Serve a stored profile image.
async fn serve_upload(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let Some(path) = state.images.path_for(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, ImageStore::content_type(&name))],
            bytes,
        )
            .into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Create the uploads directory. Call this before starting the server.
pub async fn init_storage(config: &ServerConfig) -> std::io::Result<()> {
    ImageStore::new(&config.uploads_dir).ensure_dir().await
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_storage` before this to create the uploads directory.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    init_storage(&config).await.expect("Failed to create uploads directory");

    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
