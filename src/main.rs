//! AuthGate daemon
//!
//! Wires the stores, applies migrations, and runs the maintenance
//! scheduler until interrupted.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use authgate_auth::AuthEngine;
use authgate_core::config::AppConfig;
use authgate_core::error::AppError;
use authgate_database::DatabasePool;
use authgate_database::migration::run_migrations;
use authgate_worker::{MaintenanceJob, MaintenanceScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("AUTHGATE_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("AUTHGATE_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_from(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main daemon run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AuthGate v{}", env!("CARGO_PKG_VERSION"));

    tracing::info!("Connecting to database...");
    let db_pool = DatabasePool::connect(&config.database).await?;

    run_migrations(db_pool.pool()).await?;

    tracing::info!(
        "Initializing auth engine (cache provider: {})...",
        config.cache.provider
    );
    let engine = AuthEngine::connect(&config, &db_pool).await?;

    let mut scheduler = if config.worker.enabled {
        let job = Arc::new(MaintenanceJob::new(
            Arc::clone(&engine.ledger),
            Arc::clone(&engine.lockout),
            Arc::clone(&engine.revocation),
            Arc::clone(&engine.clock),
        ));
        let scheduler = MaintenanceScheduler::new(job, config.worker.clone()).await?;
        scheduler.register().await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Maintenance scheduler disabled");
        None
    };

    tracing::info!("AuthGate ready");
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;
    tracing::info!("Shutdown signal received");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db_pool.close().await;

    tracing::info!("AuthGate stopped");
    Ok(())
}
