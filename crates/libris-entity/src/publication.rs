//! Catalog publication (read-only to the circulation engine).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::PublicationId;

/// A catalog entry that copies are instances of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Publication {
    /// Unique publication identifier.
    pub id: PublicationId,
    /// Title shown in notifications.
    pub title: String,
    /// When the publication was catalogued.
    pub created_at: DateTime<Utc>,
}
