//! Cron scheduler for the expiry sweep and loan reminders.

use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use libris_core::config::WorkerConfig;
use libris_core::error::AppError;

use crate::jobs::{ExpirySweepJob, LoanReminderJob};

/// Cron-based scheduler for the circulation background jobs
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Register the sweep and the reminders according to `config`
    pub async fn register_default_tasks(
        &self,
        config: &WorkerConfig,
        sweep: ExpirySweepJob,
        reminders: LoanReminderJob,
    ) -> Result<(), AppError> {
        self.register_expiry_sweep(config.sweep_interval_seconds, sweep)
            .await?;
        self.register_loan_reminders(&config.reminder_cron, reminders)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Expiry sweep, every `interval_seconds`
    async fn register_expiry_sweep(
        &self,
        interval_seconds: u64,
        sweep: ExpirySweepJob,
    ) -> Result<(), AppError> {
        if interval_seconds == 0 {
            return Err(AppError::configuration(
                "worker.sweep_interval_seconds must be greater than zero",
            ));
        }

        let job = CronJob::new_repeated_async(
            Duration::from_secs(interval_seconds),
            move |_uuid, _lock| {
                let sweep = sweep.clone();
                Box::pin(async move {
                    sweep.run().await;
                })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create expiry_sweep schedule: {e}")))?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add expiry_sweep schedule: {e}"))
        })?;

        tracing::info!(interval_seconds, "Registered: expiry_sweep");
        Ok(())
    }

    /// Loan reminders, on the configured cron expression
    async fn register_loan_reminders(
        &self,
        cron: &str,
        reminders: LoanReminderJob,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let reminders = reminders.clone();
            Box::pin(async move {
                // Failures are already logged by the job.
                let _ = reminders.run().await;
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid loan_reminders schedule '{cron}': {e}"))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add loan_reminders schedule: {e}"))
        })?;

        tracing::info!(cron = %cron, "Registered: loan_reminders");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use libris_core::clock::SystemClock;
    use libris_core::error::ErrorKind;
    use libris_database::{MemoryNotifier, MemoryStore};
    use libris_service::{CirculationPolicy, CirculationService};

    fn jobs() -> (ExpirySweepJob, LoanReminderJob) {
        let circulation = Arc::new(CirculationService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            CirculationPolicy::default(),
            Arc::new(MemoryNotifier::new()),
        ));
        (
            ExpirySweepJob::new(circulation.clone()),
            LoanReminderJob::new(circulation),
        )
    }

    #[tokio::test]
    async fn test_invalid_reminder_cron_is_configuration_error() {
        let scheduler = CronScheduler::new().await.unwrap();
        let (sweep, reminders) = jobs();
        let config = WorkerConfig {
            reminder_cron: "every morning".to_string(),
            ..WorkerConfig::default()
        };

        let err = scheduler
            .register_default_tasks(&config, sweep, reminders)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_zero_sweep_interval_is_rejected() {
        let scheduler = CronScheduler::new().await.unwrap();
        let (sweep, reminders) = jobs();
        let config = WorkerConfig {
            sweep_interval_seconds: 0,
            ..WorkerConfig::default()
        };

        let err = scheduler
            .register_default_tasks(&config, sweep, reminders)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
