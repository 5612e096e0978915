//! Audit actions recorded by the circulation engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CopyId, UserId};

/// What happened, from the audit log's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A user reserved a copy.
    ReservationCreated,
    /// A user cancelled their own reservation.
    ReservationCancelled,
    /// Staff cancelled a reservation.
    ReservationCancelledByAdmin,
    /// A reservation was expired while attempting to issue it.
    ReservationExpired,
    /// A copy left the library on loan.
    LoanCreated,
    /// A loaned copy came back.
    LoanReturned,
    /// A copy was added to the inventory.
    CopyCreated,
    /// A copy was withdrawn (soft-deleted).
    CopyDeleted,
}

impl AuditAction {
    /// Return the action as the string stored in the audit log.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReservationCreated => "RESERVATION_CREATED",
            Self::ReservationCancelled => "RESERVATION_CANCELLED",
            Self::ReservationCancelledByAdmin => "RESERVATION_CANCELLED_BY_ADMIN",
            Self::ReservationExpired => "RESERVATION_EXPIRED",
            Self::LoanCreated => "LOAN_CREATED",
            Self::LoanReturned => "LOAN_RETURNED",
            Self::CopyCreated => "COPY_CREATED",
            Self::CopyDeleted => "COPY_DELETED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit record: who did what to which copy, on whose behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// The user who performed the action.
    pub actor_id: UserId,
    /// The user affected, if any.
    pub target_user_id: Option<UserId>,
    /// The action.
    pub action: AuditAction,
    /// The copy involved, if any.
    pub copy_id: Option<CopyId>,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}
