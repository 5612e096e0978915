//! Copy inventory commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_core::types::{CopyId, PublicationId, UserId};
use libris_entity::Copy;

use crate::output::{self, OutputFormat};

/// Arguments for copy commands
#[derive(Debug, Args)]
pub struct CopyArgs {
    /// Copy subcommand
    #[command(subcommand)]
    pub command: CopyCommand,
}

/// Copy subcommands
#[derive(Debug, Subcommand)]
pub enum CopyCommand {
    /// Add a copy of a publication
    Add {
        /// Publication ID
        publication: PublicationId,
        /// Acting admin user ID
        #[arg(long)]
        admin: UserId,
    },
    /// Withdraw an available copy
    Withdraw {
        /// Copy ID
        copy: CopyId,
        /// Acting admin user ID
        #[arg(long)]
        admin: UserId,
    },
    /// Check whether a publication can be reserved now
    Available {
        /// Publication ID
        publication: PublicationId,
    },
}

/// Copy display row
#[derive(Debug, Serialize, Tabled)]
struct CopyRow {
    /// Copy ID
    id: i64,
    /// Publication ID
    publication: i64,
    /// Inventory code
    inventory_code: String,
    /// Status
    status: String,
}

impl From<&Copy> for CopyRow {
    fn from(c: &Copy) -> Self {
        Self {
            id: c.id.get(),
            publication: c.publication_id.get(),
            inventory_code: c.inventory_code.clone(),
            status: c.status.to_string(),
        }
    }
}

/// Execute copy commands
pub async fn execute(args: &CopyArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let circulation = super::build_circulation(config).await?;

    match &args.command {
        CopyCommand::Add { publication, admin } => {
            let copy = circulation.add_copy(*publication, *admin).await?;
            output::print_item(&CopyRow::from(&copy), format);
        }
        CopyCommand::Withdraw { copy, admin } => {
            let copy = circulation.withdraw_copy(*copy, *admin).await?;
            output::print_item(&CopyRow::from(&copy), format);
        }
        CopyCommand::Available { publication } => {
            if circulation.can_reserve(*publication).await? {
                output::print_success(&format!("Publication {publication} has an available copy"));
            } else {
                println!("Publication {publication} has no available copy");
            }
        }
    }

    Ok(())
}
