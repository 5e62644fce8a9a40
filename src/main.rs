//! Simple Backuper: runs scheduled backup scripts and uploads their output
//! to S3-compatible object storage.
//!
//! Main entry point that wires configuration, storage, and the scheduler together.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use backuper_core::config::BackuperConfig;
use backuper_core::config::logging::LoggingConfig;
use backuper_core::error::AppError;
use backuper_core::traits::ObjectStore;
use backuper_storage::{S3ObjectStore, ensure_bucket};
use backuper_worker::{BackupScheduler, Environment, JobRunner};

#[tokio::main]
async fn main() {
    let config = match BackuperConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!("Backuper error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(true)
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

async fn run(config: BackuperConfig) -> Result<(), AppError> {
    tracing::info!("Starting Simple Backuper v{}", env!("CARGO_PKG_VERSION"));

    let jobs = config.load_jobs()?;
    tracing::info!(jobs = jobs.jobs.len(), "Backup jobs loaded");

    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.storage).await?);
    tracing::info!(provider = store.provider_type(), "Object store ready");
    ensure_bucket(store.as_ref(), &config.storage).await?;

    let environment = Arc::new(Environment::capture());
    let scheduler = BackupScheduler::new(config.worker.schedule_timezone).await?;

    for job in jobs.jobs {
        let runner = JobRunner::new(
            Arc::new(job),
            Arc::clone(&environment),
            Arc::clone(&store),
            config.storage.bucket.clone(),
            &config.worker,
        );
        scheduler.register(Arc::new(runner)).await?;
    }

    scheduler.start().await?;

    shutdown_signal().await;
    tracing::info!("stopping scheduler");
    scheduler.shutdown().await?;

    tracing::info!("Simple Backuper stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
