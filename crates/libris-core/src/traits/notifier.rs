//! Outbound user notification.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::message::Notification;

/// Receives "user must be told X" events.
///
/// Delivery is best-effort from the engine's point of view: it is called
/// after the circulation transaction commits, and a failure is logged but
/// never undoes the state change.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver (or queue for delivery) one notification.
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}
