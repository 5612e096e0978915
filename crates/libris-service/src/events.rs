//! Audit and notification emission.
//!
//! Audit records are written inside the circulation transaction, so an
//! operation commits together with its audit entry or not at all.
//! Notifications go out only after commit; a delivery failure is logged
//! and dropped and never reaches the caller of the circulation operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use libris_core::result::CirculationResult;
use libris_core::traits::Notifier;
use libris_core::types::{AuditAction, AuditRecord, CopyId, Notification, UserId};
use libris_database::CirculationTx;

/// Append an audit record to the open transaction.
pub async fn record_audit(
    tx: &mut dyn CirculationTx,
    actor_id: UserId,
    target_user_id: Option<UserId>,
    action: AuditAction,
    copy_id: Option<CopyId>,
    at: DateTime<Utc>,
) -> CirculationResult<()> {
    let record = AuditRecord {
        actor_id,
        target_user_id,
        action,
        copy_id,
        created_at: at,
    };
    tx.record_audit(&record).await.map_err(|e| {
        warn!(actor_id = %actor_id, action = %action, error = %e, "Failed to write audit entry");
        e.into()
    })
}

/// Best-effort delivery of user notifications.
#[derive(Debug, Clone)]
pub struct CirculationEvents {
    /// User notification collaborator.
    notifier: Arc<dyn Notifier>,
}

impl CirculationEvents {
    /// Creates a new event emitter.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Tell a user something. Returns whether delivery succeeded.
    pub async fn notify(&self, notification: Notification) -> bool {
        let user_id = notification.user_id;
        let kind = notification.kind;
        match self.notifier.notify(notification).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user_id = %user_id, kind = %kind, error = %e, "Failed to notify user");
                false
            }
        }
    }
}
