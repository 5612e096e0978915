//! Stored audit log entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::{AuditLogId, CopyId, UserId};

/// One immutable row of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    /// Unique entry identifier.
    pub id: AuditLogId,
    /// Who acted.
    pub actor_id: UserId,
    /// Whom the action affected.
    pub target_user_id: Option<UserId>,
    /// Action name, e.g. `RESERVATION_CREATED`.
    pub action: String,
    /// Copy involved.
    pub copy_id: Option<CopyId>,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}
