//! Scheduled jobs for Libris.
//!
//! This crate provides:
//! - The expiry sweep, which frees copies held by reservations nobody picked up
//! - The daily loan reminder run
//! - A cron scheduler that drives both

pub mod jobs;
pub mod scheduler;

pub use jobs::{ExpirySweepJob, LoanReminderJob};
pub use scheduler::CronScheduler;
