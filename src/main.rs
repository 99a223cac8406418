use clap::Parser;
use filmcuts::cli::{
    Args, build_config, init_logging, load_secrets, open_database, validate_public_origin,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let secrets = load_secrets(&args);

    let Some(public_origin) = validate_public_origin(&args.public_origin) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let config = build_config(db, secrets, &public_origin, args.uploads_dir);

    if let Err(e) = filmcuts::init_storage(&config).await {
        error!(error = %e, "Failed to create uploads directory");
        std::process::exit(1);
    }

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let local_addr = listener.local_addr().unwrap();
    info!(address = %local_addr, "Listening");

    if let Err(e) = filmcuts::run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
