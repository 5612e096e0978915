//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler runs in this process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
    /// Cron expression (with seconds) for the loan reminder job.
    #[serde(default = "default_reminder_cron")]
    pub reminder_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_interval_seconds: default_sweep_interval(),
            reminder_cron: default_reminder_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_reminder_cron() -> String {
    "0 0 8 * * *".to_string()
}
