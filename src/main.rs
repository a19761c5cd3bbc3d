mod config;
mod database;
mod error;
mod models;
mod services;

use crate::config::Config;
use crate::database::MySqlConnector;
use crate::services::{build_object_store, ExportJob, SyncScheduler, SystemClock};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize structured logging
    init_logging();

    info!("Starting db-sync v{}", env!("CARGO_PKG_VERSION"));

    // Configuration is read once; a missing variable stops the process here.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Source: {:?}", config.database);
    info!(
        "Destination: {:?} bucket {}",
        config.storage.storage_type, config.storage.bucket
    );

    let store = match build_object_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize object store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let job = match ExportJob::new(
        Arc::new(MySqlConnector::new(&config.database)),
        store,
        Arc::new(SystemClock),
        config.export.window,
    ) {
        Ok(job) => Arc::new(job),
        Err(e) => {
            error!("Failed to initialize export job: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let scheduler = SyncScheduler::new(job, config.schedule.interval);

    if config.schedule.run_once {
        let response = scheduler.trigger().await;
        match serde_json::to_string(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to encode response: {}", e),
        }
        return if response.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    scheduler
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("db-sync stopped");
    ExitCode::SUCCESS
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "db_sync=info".to_string());
    let log_format = std::env::var("DB_SYNC_LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&log_level));

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty())
            .init();
    }
}
