//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::jwt::TokenSecrets;
use clap::Parser;
use tracing::{error, info, warn};
use url::Url;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "filmcuts", about = "Fan site backend for browsing film cuts")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "4000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "filmcuts.db")]
    pub database: String,

    /// Public origin the API is reachable at (e.g., "https://cuts.example.com").
    /// An https origin enables the Secure flag on the refresh cookie.
    #[arg(long, default_value = "http://localhost:4000")]
    pub public_origin: String,

    /// Directory profile images are stored in
    #[arg(long, default_value = "uploads")]
    pub uploads_dir: String,

    /// Secret for signing access tokens
    #[arg(
        long,
        env = "ACCESS_TOKEN_SECRET",
        default_value = TokenSecrets::DEFAULT,
        hide_env_values = true
    )]
    pub access_token_secret: String,

    /// Secret for signing refresh tokens
    #[arg(
        long,
        env = "REFRESH_TOKEN_SECRET",
        default_value = TokenSecrets::DEFAULT,
        hide_env_values = true
    )]
    pub refresh_token_secret: String,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Assemble the token secrets, warning loudly when the built-in fallback
/// is still in place: with the default secret anyone can forge tokens.
pub fn load_secrets(args: &Args) -> TokenSecrets {
    let secrets = TokenSecrets {
        access: args.access_token_secret.clone(),
        refresh: args.refresh_token_secret.clone(),
    };

    if secrets.uses_default() {
        warn!(
            "Using the default token signing secret. Set ACCESS_TOKEN_SECRET and \
             REFRESH_TOKEN_SECRET before deploying; the default is trivially forgeable"
        );
    }
    if secrets.access == secrets.refresh {
        warn!("Access and refresh secrets are identical; use distinct values");
    }

    secrets
}

/// Parse and validate the public-origin URL.
/// Returns None and logs an error if validation fails.
pub fn validate_public_origin(public_origin: &str) -> Option<Url> {
    let url = match Url::parse(public_origin) {
        Ok(url) => url,
        Err(e) => {
            error!(origin = %public_origin, error = %e, "Invalid public-origin URL");
            return None;
        }
    };

    let is_https = url.scheme() == "https";
    let is_localhost = url.host_str() == Some("localhost") || url.host_str() == Some("127.0.0.1");

    if !is_https && !is_localhost {
        error!("public-origin must use HTTPS for non-localhost deployments");
        return None;
    }

    Some(url)
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    secrets: TokenSecrets,
    public_origin: &Url,
    uploads_dir: String,
) -> ServerConfig {
    ServerConfig {
        db,
        secrets,
        secure_cookies: public_origin.scheme() == "https",
        uploads_dir: uploads_dir.into(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
