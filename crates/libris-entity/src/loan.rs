//! Loan records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::{CopyId, LoanId, ReservationId, UserId};

/// A copy physically out of the library with a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Loan {
    /// Unique loan identifier.
    pub id: LoanId,
    /// The FULFILLED reservation this loan came from.
    pub reservation_id: ReservationId,
    /// The loaned copy.
    pub copy_id: CopyId,
    /// The borrower.
    pub user_id: UserId,
    /// Issuance instant.
    pub loaned_at: DateTime<Utc>,
    /// Issuance plus the loan period.
    pub due_at: DateTime<Utc>,
    /// Set exactly once, when the return is accepted.
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// Whether the copy is still out.
    pub fn is_outstanding(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Whether the loan is outstanding past its due instant.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_outstanding() && now > self.due_at
    }
}

/// Data required to insert a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLoan {
    /// The reservation being fulfilled.
    pub reservation_id: ReservationId,
    /// The copy leaving the library.
    pub copy_id: CopyId,
    /// The borrower.
    pub user_id: UserId,
    /// Issuance instant.
    pub loaned_at: DateTime<Utc>,
    /// Issuance plus the loan period.
    pub due_at: DateTime<Utc>,
}

/// An outstanding loan with the fields reminders need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LoanDetails {
    /// The loan itself.
    #[sqlx(flatten)]
    pub loan: Loan,
    /// Title of the loaned publication.
    pub title: String,
    /// Shelf code of the loaned copy.
    pub inventory_code: String,
}
