//! Daily loan reminders.

use std::sync::Arc;

use libris_core::result::CirculationResult;
use libris_service::{CirculationService, ReminderSummary};

/// Sends DUE_SOON and OVERDUE messages for outstanding loans.
#[derive(Debug, Clone)]
pub struct LoanReminderJob {
    /// Circulation facade
    circulation: Arc<CirculationService>,
}

impl LoanReminderJob {
    /// Create a new reminder job
    pub fn new(circulation: Arc<CirculationService>) -> Self {
        Self { circulation }
    }

    /// Run the reminders for today.
    pub async fn run(&self) -> CirculationResult<ReminderSummary> {
        let summary = self.circulation.send_loan_reminders().await.inspect_err(|e| {
            tracing::error!(error = %e, "Loan reminder run failed");
        })?;
        Ok(summary)
    }
}
