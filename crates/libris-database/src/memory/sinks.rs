//! In-memory notifier and audit log view used by tests and single-node setups.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use libris_core::error::AppError;
use libris_core::result::AppResult;
use libris_core::traits::Notifier;
use libris_core::types::{AuditRecord, Notification};

use super::Tables;

/// Notifier that stores every notification in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }

    /// Make subsequent deliveries fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Notifier is unavailable"));
        }
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

/// Read side of the audit records kept in a [`MemoryStore`](super::MemoryStore).
///
/// Records are written by committed transactions only; the failure switch
/// makes every subsequent [`CirculationTx::record_audit`] call fail.
///
/// [`CirculationTx::record_audit`]: crate::store::CirculationTx::record_audit
#[derive(Debug, Clone)]
pub struct MemoryAuditLog {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<AtomicBool>,
}

impl MemoryAuditLog {
    pub(super) fn new(tables: Arc<Mutex<Tables>>, failing: Arc<AtomicBool>) -> Self {
        Self { tables, failing }
    }

    /// Everything committed so far, in write order.
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.tables.lock().await.audit.clone()
    }

    /// Make subsequent writes fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}
