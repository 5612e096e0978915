//! # libris-core
//!
//! Core crate for the Libris circulation engine. Contains the unified
//! error system, the typed circulation error taxonomy, configuration
//! schemas, typed identifiers, pagination, the injectable clock, and the
//! trait implemented by the external notifier.
//!
//! This crate has **no** internal dependencies on other Libris crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AppError, CirculationError};
pub use result::{AppResult, CirculationResult};
