use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use testreq_core::config::{max_comment_len_from_env_value, store_backend_from_env_value};
use testreq_core::{ActorDirectory, ConsultationDesk, CoreConfig, IntakeService};

/// Main entry point for the consultation service
///
/// Serves the REST API on `TESTREQ_REST_ADDR` until interrupted.
///
/// # Environment Variables
/// - `TESTREQ_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TESTREQ_STORE`: `file` or `memory` (default: "file")
/// - `TESTREQ_DATA_DIR`: Directory for request records (default: "request_data")
/// - `TESTREQ_ACTORS_FILE`: YAML actor directory mapping bearer tokens to actors (required)
/// - `TESTREQ_SEED_FILE`: YAML file of requests imported at startup (optional)
/// - `TESTREQ_MAX_COMMENT_LEN`: Maximum consultation comment length (default: 2000)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("testreq=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("TESTREQ_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let store_backend = store_backend_from_env_value(
        std::env::var("TESTREQ_STORE").ok(),
        std::env::var("TESTREQ_DATA_DIR").ok(),
    )?;
    let actors_file = std::env::var("TESTREQ_ACTORS_FILE")
        .map_err(|_| anyhow::anyhow!("TESTREQ_ACTORS_FILE must be set"))?;
    let seed_file = std::env::var("TESTREQ_SEED_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    let max_comment_len =
        max_comment_len_from_env_value(std::env::var("TESTREQ_MAX_COMMENT_LEN").ok())?;

    let cfg = CoreConfig::new(
        store_backend,
        PathBuf::from(actors_file),
        seed_file,
        max_comment_len,
    )?;

    let directory = ActorDirectory::load(cfg.actors_file())?;
    tracing::info!(actors = directory.len(), "actor directory loaded");

    let store = cfg.open_store()?;
    if let Some(seed) = cfg.seed_file() {
        let summary = IntakeService::new(store.clone()).import_file(seed)?;
        tracing::info!(
            imported = summary.imported,
            skipped = summary.skipped,
            "seed file {} imported",
            seed.display()
        );
    }

    let state = AppState::new(
        ConsultationDesk::new(store, cfg.max_comment_len()),
        Arc::new(directory),
    );
    let rest_app = api_rest::router(state);

    tracing::info!("++ Starting consultation REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, rest_app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Consultation REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
