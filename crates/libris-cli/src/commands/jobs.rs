//! One-shot runs of the scheduled jobs.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use libris_core::config::AppConfig;
use libris_core::error::AppError;
use libris_worker::{ExpirySweepJob, LoanReminderJob};

use crate::output::{self, OutputFormat};

/// Reminder run display row
#[derive(Debug, Serialize, Tabled)]
struct ReminderRow {
    /// DUE_SOON reminders
    due_soon: usize,
    /// OVERDUE notices
    overdue: usize,
    /// Failed deliveries
    failed: usize,
}

/// Run the expiry sweep once
pub async fn sweep(config: &AppConfig) -> Result<(), AppError> {
    let circulation = Arc::new(super::build_circulation(config).await?);
    let expired = ExpirySweepJob::new(circulation).run().await;
    output::print_success(&format!("Expired {expired} reservations"));
    Ok(())
}

/// Send today's loan reminders once
pub async fn remind(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let circulation = Arc::new(super::build_circulation(config).await?);
    let summary = LoanReminderJob::new(circulation).run().await?;
    output::print_item(
        &ReminderRow {
            due_soon: summary.due_soon,
            overdue: summary.overdue,
            failed: summary.failed,
        },
        format,
    );
    Ok(())
}
