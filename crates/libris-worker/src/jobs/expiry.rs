//! Reservation expiry sweep.

use std::sync::Arc;

use libris_service::CirculationService;

/// Expires every ACTIVE reservation past its pickup deadline.
#[derive(Debug, Clone)]
pub struct ExpirySweepJob {
    /// Circulation facade
    circulation: Arc<CirculationService>,
}

impl ExpirySweepJob {
    /// Create a new sweep job
    pub fn new(circulation: Arc<CirculationService>) -> Self {
        Self { circulation }
    }

    /// Run one sweep and return how many reservations it expired.
    ///
    /// Never fails: store errors are logged by the circulation service
    /// and the next run tries again.
    pub async fn run(&self) -> usize {
        let expired = self.circulation.sweep_expired().await;
        if expired > 0 {
            tracing::info!(expired, "Expiry sweep finished");
        } else {
            tracing::debug!("Expiry sweep found nothing to expire");
        }
        expired
    }
}
