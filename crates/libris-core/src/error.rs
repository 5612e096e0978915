//! Unified application error types for Libris.
//!
//! Infrastructure failures are carried by [`AppError`]. Circulation
//! operations report the typed domain taxonomy [`CirculationError`], which
//! callers match on by variant; no error is ever selected by inspecting
//! message text.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed or a business rule rejected the request.
    Validation,
    /// The entity is not in the state the operation requires.
    Conflict,
    /// A row lock could not be acquired in time; the operation may be retried.
    Contention,
    /// An internal error occurred.
    Internal,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The service is temporarily unavailable.
    ServiceUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Contention => write!(f, "CONTENTION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// The unified infrastructure error used throughout Libris.
///
/// Store, configuration and collaborator failures are mapped into
/// `AppError` using `From` impls or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a lock-contention error.
    pub fn contention(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Contention, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// The kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityKind {
    /// A catalog publication.
    Publication,
    /// A physical copy.
    Copy,
    /// A reservation.
    Reservation,
    /// A loan.
    Loan,
    /// A library user.
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publication => write!(f, "publication"),
            Self::Copy => write!(f, "copy"),
            Self::Reservation => write!(f, "reservation"),
            Self::Loan => write!(f, "loan"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Typed failure of a circulation operation.
///
/// Each violated invariant has exactly one variant. Presentation layers
/// localize by variant; the engine only guarantees the kind is preserved.
#[derive(Debug, Error)]
pub enum CirculationError {
    /// The referenced entity does not exist, or is not visible to the caller.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of the missing entity.
        entity: EntityKind,
        /// Identifier that was looked up.
        id: i64,
    },
    /// The user's account standing is not ACTIVE.
    #[error("account {user_id} is not active")]
    AccountNotActive {
        /// The rejected user.
        user_id: i64,
    },
    /// The user already holds the maximum number of active items.
    #[error("active item limit of {limit} reached")]
    ActiveItemLimitExceeded {
        /// The configured limit.
        limit: u32,
    },
    /// No AVAILABLE, non-deleted copy of the publication could be claimed.
    #[error("no copy of publication {publication_id} is available")]
    NoCopyAvailable {
        /// The requested publication.
        publication_id: i64,
    },
    /// The entity exists but is not in the state the transition requires.
    #[error("{entity} {id} is {status}; transition not allowed")]
    InvalidState {
        /// Kind of the entity.
        entity: EntityKind,
        /// Identifier of the entity.
        id: i64,
        /// Current status as observed inside the transaction.
        status: String,
    },
    /// The pickup deadline had passed; this call expired the reservation.
    #[error("reservation {reservation_id} passed its pickup deadline and was expired")]
    ReservationExpired {
        /// The reservation that was expired.
        reservation_id: i64,
    },
    /// The store could not acquire a lock in time. Safe to retry.
    #[error("store contention: {0}")]
    Contention(#[source] AppError),
    /// Any other store failure.
    #[error(transparent)]
    Store(AppError),
}

impl CirculationError {
    /// Shorthand for [`CirculationError::NotFound`].
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Shorthand for [`CirculationError::InvalidState`].
    pub fn invalid_state(entity: EntityKind, id: i64, status: impl fmt::Display) -> Self {
        Self::InvalidState {
            entity,
            id,
            status: status.to_string(),
        }
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention(_))
    }

    /// Whether this error blocked the creation of a reservation.
    pub fn is_reservation_blocked(&self) -> bool {
        matches!(
            self,
            Self::AccountNotActive { .. }
                | Self::ActiveItemLimitExceeded { .. }
                | Self::NoCopyAvailable { .. }
        )
    }
}

impl From<AppError> for CirculationError {
    fn from(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Contention => Self::Contention(err),
            _ => Self::Store(err),
        }
    }
}

impl From<CirculationError> for AppError {
    fn from(err: CirculationError) -> Self {
        match err {
            CirculationError::Contention(inner) | CirculationError::Store(inner) => inner,
            CirculationError::NotFound { .. } => Self::not_found(err.to_string()),
            _ if err.is_reservation_blocked() => Self::validation(err.to_string()),
            // InvalidState, ReservationExpired
            _ => Self::conflict(err.to_string()),
        }
    }
}
