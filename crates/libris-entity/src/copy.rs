//! Physical copy and its status machine.

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::{CopyId, PublicationId};

/// Where a copy is in circulation.
///
/// ```text
/// AVAILABLE --claim--> RESERVED --issue--> LOANED
///     ^                   |                   |
///     +----cancel/expire--+                   |
///     +---------------return------------------+
/// AVAILABLE --withdraw--> UNAVAILABLE
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "copy_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyStatus {
    /// On the shelf, claimable.
    Available,
    /// Held by an ACTIVE reservation.
    Reserved,
    /// Out on an outstanding loan.
    Loaned,
    /// Withdrawn from circulation.
    Unavailable,
}

impl CopyStatus {
    /// Whether moving from `self` to `next` is a legal copy transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::Reserved)
                | (Self::Reserved, Self::Loaned)
                | (Self::Reserved, Self::Available)
                | (Self::Loaned, Self::Available)
                | (Self::Available, Self::Unavailable)
        )
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Reserved => "RESERVED",
            Self::Loaned => "LOANED",
            Self::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical instance of a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Copy {
    /// Unique copy identifier; lower ids are allocated first.
    pub id: CopyId,
    /// The publication this is a copy of.
    pub publication_id: PublicationId,
    /// Unique shelf code, e.g. `LIB-2025-000042`.
    pub inventory_code: String,
    /// Current circulation status.
    pub status: CopyStatus,
    /// When the copy was added.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// Set once when the copy is withdrawn.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Copy {
    /// Whether the copy has been withdrawn.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether the allocator may claim this copy.
    pub fn is_allocatable(&self) -> bool {
        self.status == CopyStatus::Available && !self.is_deleted()
    }
}

/// Data required to add a copy to the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCopy {
    /// The publication this is a copy of.
    pub publication_id: PublicationId,
    /// When the copy is added.
    pub created_at: DateTime<Utc>,
}

/// Shelf code for a copy: `LIB-<year>-<id padded to six digits>`.
pub fn inventory_code(added_at: DateTime<Utc>, id: CopyId) -> String {
    format!("LIB-{}-{:06}", added_at.year(), id.get())
}
