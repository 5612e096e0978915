//! Audit log inspection.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_core::types::UserId;
use libris_core::types::pagination::PageRequest;
use libris_entity::AuditEntry;

use crate::output::{self, OutputFormat};

/// Arguments for audit commands
#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Audit subcommand
    #[command(subcommand)]
    pub command: AuditCommand,
}

/// Audit subcommands
#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// List audit entries, newest first
    List {
        /// Only entries written by this actor
        #[arg(long)]
        actor: Option<UserId>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },
}

/// Audit entry display row
#[derive(Debug, Serialize, Tabled)]
struct AuditRow {
    /// Entry ID
    id: i64,
    /// Actor
    actor: i64,
    /// Affected user
    target: String,
    /// Action
    action: String,
    /// Copy
    copy: String,
    /// Timestamp
    at: String,
}

impl From<&AuditEntry> for AuditRow {
    fn from(e: &AuditEntry) -> Self {
        Self {
            id: e.id.get(),
            actor: e.actor_id.get(),
            target: e
                .target_user_id
                .map_or_else(|| "-".to_string(), |u| u.to_string()),
            action: e.action.clone(),
            copy: e.copy_id.map_or_else(|| "-".to_string(), |c| c.to_string()),
            at: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Execute audit commands
pub async fn execute(
    args: &AuditArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    match &args.command {
        AuditCommand::List {
            actor,
            page,
            page_size,
        } => {
            let result = pool
                .audit_log()
                .search(*actor, &PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<AuditRow> = result.items.iter().map(AuditRow::from).collect();
            output::print_list(&rows, format);
            output::print_page(&result, format);
        }
    }

    pool.close().await;
    Ok(())
}
