//! Reservation commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_core::types::pagination::PageRequest;
use libris_core::types::{PublicationId, ReservationId, UserId};
use libris_entity::Reservation;

use crate::output::{self, OutputFormat};

/// Arguments for reservation commands
#[derive(Debug, Args)]
pub struct ReservationArgs {
    /// Reservation subcommand
    #[command(subcommand)]
    pub command: ReservationCommand,
}

/// Reservation subcommands
#[derive(Debug, Subcommand)]
pub enum ReservationCommand {
    /// Reserve a copy of a publication for a user
    Create {
        /// Reserving user ID
        #[arg(long)]
        user: UserId,
        /// Publication ID
        #[arg(long)]
        publication: PublicationId,
    },
    /// Cancel a reservation on behalf of its owner
    Cancel {
        /// Reservation ID
        id: ReservationId,
        /// Owning user ID
        #[arg(long)]
        user: UserId,
    },
    /// Cancel a reservation as staff
    AdminCancel {
        /// Reservation ID
        id: ReservationId,
        /// Acting admin user ID
        #[arg(long)]
        admin: UserId,
    },
    /// List active reservations, newest first
    List {
        /// Only this user's reservations
        #[arg(long)]
        user: Option<UserId>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 20)]
        page_size: u64,
    },
}

/// Reservation display row
#[derive(Debug, Serialize, Tabled)]
pub struct ReservationRow {
    /// Reservation ID
    id: i64,
    /// User ID
    user: i64,
    /// Copy ID
    copy: i64,
    /// Status
    status: String,
    /// Reserved at
    reserved_at: String,
    /// Pickup deadline
    pickup_deadline: String,
}

impl From<&Reservation> for ReservationRow {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id.get(),
            user: r.user_id.get(),
            copy: r.copy_id.get(),
            status: r.status.to_string(),
            reserved_at: r.reserved_at.format("%Y-%m-%d %H:%M").to_string(),
            pickup_deadline: r.pickup_deadline.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute reservation commands
pub async fn execute(
    args: &ReservationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let circulation = super::build_circulation(config).await?;

    match &args.command {
        ReservationCommand::Create { user, publication } => {
            let reservation = circulation.reserve(*user, *publication).await?;
            output::print_item(&ReservationRow::from(&reservation), format);
        }
        ReservationCommand::Cancel { id, user } => {
            circulation.cancel_by_user(*id, *user).await?;
            output::print_success(&format!("Reservation {id} cancelled"));
        }
        ReservationCommand::AdminCancel { id, admin } => {
            circulation.cancel_by_admin(*id, *admin).await?;
            output::print_success(&format!("Reservation {id} cancelled by admin"));
        }
        ReservationCommand::List {
            user: Some(user), ..
        } => {
            let reservations = circulation.user_reservations(*user).await?;
            let rows: Vec<ReservationRow> = reservations.iter().map(ReservationRow::from).collect();
            output::print_list(&rows, format);
        }
        ReservationCommand::List {
            user: None,
            page,
            page_size,
        } => {
            let result = circulation
                .active_reservations(&PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<ReservationRow> = result.items.iter().map(ReservationRow::from).collect();
            output::print_list(&rows, format);
            output::print_page(&result, format);
        }
    }

    Ok(())
}
