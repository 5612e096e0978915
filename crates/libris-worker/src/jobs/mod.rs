//! Job implementations. Each job is directly runnable, without the scheduler.

pub mod expiry;
pub mod reminder;

pub use expiry::ExpirySweepJob;
pub use reminder::LoanReminderJob;
