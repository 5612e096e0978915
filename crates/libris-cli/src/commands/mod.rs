//! CLI command definitions and dispatch.

pub mod audit;
pub mod copy;
pub mod jobs;
pub mod loan;
pub mod messages;
pub mod migrate;
pub mod reservation;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use libris_core::clock::SystemClock;
use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_database::DatabasePool;
use libris_service::{CirculationPolicy, CirculationService};

use crate::output::OutputFormat;

/// Libris - lending library circulation
#[derive(Debug, Parser)]
#[command(name = "libris", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (without extension)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from config/{env}
    #[arg(short, long, env = "LIBRIS_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Run the expiry sweep once
    Sweep,
    /// Send today's loan reminders once
    Remind,
    /// Reservations
    Reservation(reservation::ReservationArgs),
    /// Loans and returns
    Loan(loan::LoanArgs),
    /// Copy inventory
    Copy(copy::CopyArgs),
    /// Audit log
    Audit(audit::AuditArgs),
    /// User messages
    Messages(messages::MessagesArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.config, &self.env)?;
        debug!(config = %self.config, env = %self.env, "Configuration loaded");
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Sweep => jobs::sweep(&config).await,
            Commands::Remind => jobs::remind(&config, self.format).await,
            Commands::Reservation(args) => reservation::execute(args, &config, self.format).await,
            Commands::Loan(args) => loan::execute(args, &config, self.format).await,
            Commands::Copy(args) => copy::execute(args, &config, self.format).await,
            Commands::Audit(args) => audit::execute(args, &config, self.format).await,
            Commands::Messages(args) => messages::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: wire the circulation engine over PostgreSQL
pub async fn build_circulation(config: &AppConfig) -> Result<CirculationService, AppError> {
    let pool = create_db_pool(config).await?;

    Ok(CirculationService::new(
        Arc::new(pool.circulation_store()),
        Arc::new(SystemClock),
        CirculationPolicy::from_config(&config.circulation),
        Arc::new(pool.messages()),
    ))
}
