//! Convenience result type aliases for Libris.

use crate::error::{AppError, CirculationError};

/// A specialized `Result` type for infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;

/// Result of a circulation operation, carrying the typed domain error.
pub type CirculationResult<T> = Result<T, CirculationError>;
