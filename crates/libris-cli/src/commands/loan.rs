//! Loan commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_core::types::pagination::PageRequest;
use libris_core::types::{LoanId, ReservationId, UserId};
use libris_entity::Loan;

use crate::output::{self, OutputFormat};

/// Arguments for loan commands
#[derive(Debug, Args)]
pub struct LoanArgs {
    /// Loan subcommand
    #[command(subcommand)]
    pub command: LoanCommand,
}

/// Loan subcommands
#[derive(Debug, Subcommand)]
pub enum LoanCommand {
    /// Issue the copy held by a reservation
    Issue {
        /// Reservation ID
        reservation: ReservationId,
        /// Acting admin user ID
        #[arg(long)]
        admin: UserId,
    },
    /// Accept a returned copy
    Return {
        /// Loan ID
        loan: LoanId,
        /// Acting admin user ID
        #[arg(long)]
        admin: UserId,
    },
    /// List outstanding loans, earliest due first
    List {
        /// Only this user's loans
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

/// Loan display row
#[derive(Debug, Serialize, Tabled)]
pub struct LoanRow {
    /// Loan ID
    id: i64,
    /// Reservation ID
    reservation: i64,
    /// User ID
    user: i64,
    /// Copy ID
    copy: i64,
    /// Loaned at
    loaned_at: String,
    /// Due date
    due: String,
    /// Returned at
    returned_at: String,
}

impl From<&Loan> for LoanRow {
    fn from(l: &Loan) -> Self {
        Self {
            id: l.id.get(),
            reservation: l.reservation_id.get(),
            user: l.user_id.get(),
            copy: l.copy_id.get(),
            loaned_at: l.loaned_at.format("%Y-%m-%d %H:%M").to_string(),
            due: l.due_at.format("%Y-%m-%d").to_string(),
            returned_at: l
                .returned_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute loan commands
pub async fn execute(args: &LoanArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let circulation = super::build_circulation(config).await?;

    match &args.command {
        LoanCommand::Issue { reservation, admin } => {
            let loan = circulation.issue_loan(*reservation, *admin).await?;
            output::print_item(&LoanRow::from(&loan), format);
        }
        LoanCommand::Return { loan, admin } => {
            let loan = circulation.accept_return(*loan, *admin).await?;
            output::print_item(&LoanRow::from(&loan), format);
        }
        LoanCommand::List {
            user: Some(user), ..
        } => {
            let loans = circulation.user_loans(*user).await?;
            let rows: Vec<LoanRow> = loans.iter().map(LoanRow::from).collect();
            output::print_list(&rows, format);
        }
        LoanCommand::List {
            user: None,
            page,
            page_size,
        } => {
            let result = circulation
                .outstanding_loans(&PageRequest::new(*page, *page_size))
                .await?;
            let rows: Vec<LoanRow> = result.items.iter().map(LoanRow::from).collect();
            output::print_list(&rows, format);
            output::print_page(&result, format);
        }
    }

    Ok(())
}
