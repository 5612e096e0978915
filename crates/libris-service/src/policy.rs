//! Circulation rules as durations, derived from configuration.

use chrono::{DateTime, Duration, Utc};

use libris_core::config::CirculationConfig;
use libris_core::config::circulation::{LOAN_PERIOD_DAYS, MAX_ACTIVE_ITEMS, PICKUP_WINDOW_DAYS};

/// The rules every circulation decision is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CirculationPolicy {
    /// Time between reservation and pickup deadline.
    pub pickup_window: Duration,
    /// Time between issuance and due date.
    pub loan_period: Duration,
    /// ACTIVE reservations plus outstanding loans a user may hold.
    pub max_active_items: u32,
    /// Days before the due date a DUE_SOON reminder is sent.
    pub due_soon_days: u32,
    /// Days after the due date an OVERDUE notice is sent.
    pub overdue_after_days: u32,
}

impl CirculationPolicy {
    /// Build the policy from the `circulation` configuration section.
    pub fn from_config(config: &CirculationConfig) -> Self {
        Self {
            pickup_window: Duration::days(i64::from(config.pickup_window_days)),
            loan_period: Duration::days(i64::from(config.loan_period_days)),
            max_active_items: config.max_active_items,
            due_soon_days: config.due_soon_days,
            overdue_after_days: config.overdue_after_days,
        }
    }

    /// Pickup deadline of a reservation made at `reserved_at`.
    pub fn pickup_deadline(&self, reserved_at: DateTime<Utc>) -> DateTime<Utc> {
        reserved_at + self.pickup_window
    }

    /// Due date of a loan issued at `loaned_at`.
    pub fn due_at(&self, loaned_at: DateTime<Utc>) -> DateTime<Utc> {
        loaned_at + self.loan_period
    }
}

impl Default for CirculationPolicy {
    fn default() -> Self {
        Self {
            pickup_window: Duration::days(i64::from(PICKUP_WINDOW_DAYS)),
            loan_period: Duration::days(i64::from(LOAN_PERIOD_DAYS)),
            max_active_items: MAX_ACTIVE_ITEMS,
            due_soon_days: 3,
            overdue_after_days: 1,
        }
    }
}
