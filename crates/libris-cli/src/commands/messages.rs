//! A user's message inbox.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_core::types::UserId;
use libris_core::types::pagination::PageRequest;
use libris_entity::Message;

use crate::output::{self, OutputFormat};

/// Arguments for message commands
#[derive(Debug, Args)]
pub struct MessagesArgs {
    /// Message subcommand
    #[command(subcommand)]
    pub command: MessagesCommand,
}

/// Message subcommands
#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    /// List a user's messages, newest first
    List {
        /// Recipient user ID
        #[arg(long)]
        user: UserId,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },
}

/// Message display row
#[derive(Debug, Serialize, Tabled)]
struct MessageRow {
    /// Message ID
    id: i64,
    /// Kind
    kind: String,
    /// Title
    title: String,
    /// Body
    body: String,
    /// Received
    received: String,
}

impl From<&Message> for MessageRow {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.get(),
            kind: m.kind.to_string(),
            title: m.title.clone(),
            body: m.body.clone(),
            received: m.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute message commands
pub async fn execute(
    args: &MessagesArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let pool = super::create_db_pool(config).await?;

    match &args.command {
        MessagesCommand::List {
            user,
            page,
            page_size,
        } => {
            let result = pool
                .messages()
                .find_by_user(*user, &PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<MessageRow> = result.items.iter().map(MessageRow::from).collect();
            output::print_list(&rows, format);
            output::print_page(&result, format);
        }
    }

    pool.close().await;
    Ok(())
}
