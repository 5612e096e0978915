//! Circulation rules: pickup window, loan period, per-user item limit.

use serde::{Deserialize, Serialize};

/// Days a reservation waits for pickup before it expires.
pub const PICKUP_WINDOW_DAYS: u32 = 3;
/// Days from issuance until a loan is due.
pub const LOAN_PERIOD_DAYS: u32 = 30;
/// Maximum ACTIVE reservations plus outstanding loans per user.
pub const MAX_ACTIVE_ITEMS: u32 = 3;

/// Circulation rule configuration.
///
/// The defaults are the library's fixed rules; deployments normally leave
/// this section out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CirculationConfig {
    /// Pickup window in days.
    #[serde(default = "default_pickup_window")]
    pub pickup_window_days: u32,
    /// Loan period in days.
    #[serde(default = "default_loan_period")]
    pub loan_period_days: u32,
    /// Active item limit per user.
    #[serde(default = "default_max_active_items")]
    pub max_active_items: u32,
    /// A DUE_SOON reminder goes out this many days before the due date.
    #[serde(default = "default_due_soon")]
    pub due_soon_days: u32,
    /// An OVERDUE notice goes out this many days after the due date.
    #[serde(default = "default_overdue_after")]
    pub overdue_after_days: u32,
}

impl Default for CirculationConfig {
    fn default() -> Self {
        Self {
            pickup_window_days: PICKUP_WINDOW_DAYS,
            loan_period_days: LOAN_PERIOD_DAYS,
            max_active_items: MAX_ACTIVE_ITEMS,
            due_soon_days: default_due_soon(),
            overdue_after_days: default_overdue_after(),
        }
    }
}

fn default_pickup_window() -> u32 {
    PICKUP_WINDOW_DAYS
}

fn default_loan_period() -> u32 {
    LOAN_PERIOD_DAYS
}

fn default_max_active_items() -> u32 {
    MAX_ACTIVE_ITEMS
}

fn default_due_soon() -> u32 {
    3
}

fn default_overdue_after() -> u32 {
    1
}
