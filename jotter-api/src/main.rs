//! Jotter API Server Entry Point
//!
//! Loads configuration, waits for the database, creates the schema and
//! serves the Axum router until Ctrl-C.

use std::sync::Arc;

use jotter_api::telemetry::{init_tracing, TelemetryConfig};
use jotter_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, CacheSettings, DbClient, DbConfig,
};
use jotter_storage::NotesCache;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let api_config = ApiConfig::from_env().map_err(|e| ApiError::invalid_input(e.to_string()))?;
    let cache_settings =
        CacheSettings::from_env().map_err(|e| ApiError::invalid_input(e.to_string()))?;

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    if let Err(e) = wait_for_database(&db, &api_config).await {
        tracing::error!(
            host = %db_config.host,
            attempts = api_config.startup_attempts,
            error = %e,
            "Database unreachable, giving up"
        );
        std::process::exit(1);
    }

    let cache = NotesCache::new(cache_settings.open_backend()?);
    tracing::info!(
        backend = cache.backend_name(),
        ttl_secs = cache_settings.ttl.as_secs(),
        "Notes cache ready"
    );

    let state = AppState::build(Arc::new(db), cache, cache_settings.ttl, &api_config);
    let app = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Jotter API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

/// Create the schema, retrying with a fixed backoff while the database
/// comes up.
async fn wait_for_database(db: &DbClient, config: &ApiConfig) -> ApiResult<()> {
    let mut attempt = 1;
    loop {
        match db.init_schema().await {
            Ok(()) => {
                tracing::info!(attempt, "Database ready");
                return Ok(());
            }
            Err(e) if attempt < config.startup_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = config.startup_attempts,
                    error = %e,
                    "Database not ready, retrying"
                );
                tokio::time::sleep(config.startup_backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
