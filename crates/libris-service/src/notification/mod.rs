//! User-facing message content and the daily loan reminder run.

pub mod reminder;
pub mod rules;

pub use reminder::{LoanReminderService, ReminderSummary};
pub use rules::NotificationRules;
