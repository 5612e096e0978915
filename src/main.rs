//! Libris Server - lending library circulation
//!
//! Main entry point that wires the crates together and runs the scheduled
//! jobs until shutdown.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use libris_core::clock::SystemClock;
use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_database::DatabasePool;
use libris_service::{CirculationPolicy, CirculationService};
use libris_worker::{CronScheduler, ExpirySweepJob, LoanReminderJob};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("LIBRIS_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("LIBRIS_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
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

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Libris v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db_pool = DatabasePool::connect(&config.database).await?;
    db_pool.migrate().await?;

    // ── Step 2: Circulation engine ───────────────────────────────
    let policy = CirculationPolicy::from_config(&config.circulation);
    let circulation = Arc::new(CirculationService::new(
        Arc::new(db_pool.circulation_store()),
        Arc::new(SystemClock),
        policy,
        Arc::new(db_pool.messages()),
    ));

    if !circulation.health_check().await? {
        return Err(AppError::service_unavailable("Database health check failed"));
    }
    tracing::info!(
        pickup_window_days = config.circulation.pickup_window_days,
        loan_period_days = config.circulation.loan_period_days,
        max_active_items = config.circulation.max_active_items,
        "Circulation engine ready"
    );

    // ── Step 3: Scheduled jobs ───────────────────────────────────
    let mut scheduler = if config.worker.enabled {
        tracing::info!("Starting scheduled jobs...");
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_default_tasks(
                &config.worker,
                ExpirySweepJob::new(circulation.clone()),
                LoanReminderJob::new(circulation.clone()),
            )
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduled jobs disabled");
        None
    };

    // ── Step 4: Graceful shutdown ────────────────────────────────
    shutdown_signal().await?;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    db_pool.close().await;

    tracing::info!("Libris server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() -> Result<(), AppError> {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::internal(format!("Failed to install Ctrl+C handler: {e}")))
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .map_err(|e| AppError::internal(format!("Failed to install SIGTERM handler: {e}")))?;
        signal.recv().await;
        Ok::<(), AppError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), AppError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
