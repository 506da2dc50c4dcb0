mod api;
mod app;
mod auth;
mod config;
mod db;
mod models;
mod schema;
mod storage;
mod store;
mod telemetry;

use app::{build_router, RouterOptions, ServerState};
use config::Config;
use kochbuch_core::{Kitchen, UrlSigner};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        return match api::openapi().to_pretty_json() {
            Ok(spec) => {
                println!("{}", spec);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render OpenAPI spec: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    telemetry::init_telemetry();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let pool = Arc::new(db::create_pool(&config.database_url)?);
    let signer = UrlSigner::new(&config.signing_secret, config.public_url.as_str());

    let store = Arc::new(store::PgStore::new(pool.clone()));
    let objects = Arc::new(storage::FsStorage::new(
        config.storage_dir.clone(),
        signer.clone(),
    ));
    let state = Arc::new(ServerState {
        kitchen: Kitchen::new(store, objects),
        identity: Arc::new(auth::PgIdentity::new(pool)),
        signer,
    });

    let app = build_router(
        state,
        RouterOptions {
            max_upload_bytes: config.max_upload_bytes,
            track_query_count: config.track_query_count,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.bind).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI available at {}/swagger-ui/", config.public_url);
    tracing::info!(
        "OpenAPI spec available at {}/api-docs/openapi.json",
        config.public_url
    );

    axum::serve(listener, app).await?;
    Ok(())
}
