//! Reservation and its state machine.
//!
//! ACTIVE is the only non-terminal state. Each of the four terminal
//! states is reached by exactly one [`ReservationTransition`], which also
//! stamps the matching timestamp. Nothing leaves a terminal state.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::{CopyId, ReservationId, UserId};

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Waiting for pickup.
    Active,
    /// Cancelled by the reserving user.
    CancelledByUser,
    /// Cancelled by staff.
    CancelledByAdmin,
    /// Pickup deadline passed.
    Expired,
    /// Picked up; a loan exists.
    Fulfilled,
}

impl ReservationStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::CancelledByUser => "CANCELLED_BY_USER",
            Self::CancelledByAdmin => "CANCELLED_BY_ADMIN",
            Self::Expired => "EXPIRED",
            Self::Fulfilled => "FULFILLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named move out of ACTIVE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationTransition {
    /// ACTIVE -> CANCELLED_BY_USER; copy back to AVAILABLE.
    CancelByUser,
    /// ACTIVE -> CANCELLED_BY_ADMIN; copy back to AVAILABLE.
    CancelByAdmin,
    /// ACTIVE -> EXPIRED; copy back to AVAILABLE.
    Expire,
    /// ACTIVE -> FULFILLED; copy to LOANED, loan inserted.
    Fulfill,
}

impl ReservationTransition {
    /// The status this transition lands in.
    pub fn target(self) -> ReservationStatus {
        match self {
            Self::CancelByUser => ReservationStatus::CancelledByUser,
            Self::CancelByAdmin => ReservationStatus::CancelledByAdmin,
            Self::Expire => ReservationStatus::Expired,
            Self::Fulfill => ReservationStatus::Fulfilled,
        }
    }
}

/// A user's time-boxed claim on one copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// The reserving user.
    pub user_id: UserId,
    /// The claimed copy.
    pub copy_id: CopyId,
    /// When the reservation was made.
    pub reserved_at: DateTime<Utc>,
    /// Last instant at which the copy may still be picked up (inclusive).
    pub pickup_deadline: DateTime<Utc>,
    /// Current status.
    pub status: ReservationStatus,
    /// Set by either cancellation.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Set by expiry.
    pub expired_at: Option<DateTime<Utc>>,
    /// Set by fulfillment.
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Whether the pickup deadline has passed at `now`.
    ///
    /// The deadline itself is still inside the window.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.pickup_deadline
    }

    /// Apply `transition` at `now`.
    ///
    /// Returns the current status unchanged as the error when the
    /// reservation is already terminal.
    pub fn apply(
        &mut self,
        transition: ReservationTransition,
        now: DateTime<Utc>,
    ) -> Result<(), ReservationStatus> {
        if self.status.is_terminal() {
            return Err(self.status);
        }

        match transition {
            ReservationTransition::CancelByUser | ReservationTransition::CancelByAdmin => {
                self.cancelled_at = Some(now);
            }
            ReservationTransition::Expire => {
                self.expired_at.get_or_insert(now);
            }
            ReservationTransition::Fulfill => {
                self.fulfilled_at = Some(now);
            }
        }
        self.status = transition.target();
        Ok(())
    }
}

/// Data required to insert an ACTIVE reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    /// The reserving user.
    pub user_id: UserId,
    /// The claimed copy.
    pub copy_id: CopyId,
    /// Reservation instant.
    pub reserved_at: DateTime<Utc>,
    /// Reservation instant plus the pickup window.
    pub pickup_deadline: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn active() -> Reservation {
        let at = Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap();
        Reservation {
            id: ReservationId(1),
            user_id: UserId(1),
            copy_id: CopyId(1),
            reserved_at: at,
            pickup_deadline: at + Duration::days(3),
            status: ReservationStatus::Active,
            cancelled_at: None,
            expired_at: None,
            fulfilled_at: None,
        }
    }

    #[test]
    fn test_each_transition_stamps_its_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 1, 11, 10, 0, 0).unwrap();

        let mut r = active();
        r.apply(ReservationTransition::CancelByAdmin, now).unwrap();
        assert_eq!(r.status, ReservationStatus::CancelledByAdmin);
        assert_eq!(r.cancelled_at, Some(now));
        assert!(r.expired_at.is_none() && r.fulfilled_at.is_none());

        let mut r = active();
        r.apply(ReservationTransition::Expire, now).unwrap();
        assert_eq!(r.status, ReservationStatus::Expired);
        assert_eq!(r.expired_at, Some(now));

        let mut r = active();
        r.apply(ReservationTransition::Fulfill, now).unwrap();
        assert_eq!(r.status, ReservationStatus::Fulfilled);
        assert_eq!(r.fulfilled_at, Some(now));
    }

    #[test]
    fn test_terminal_states_are_immutable() {
        let now = Utc.with_ymd_and_hms(2025, 1, 11, 10, 0, 0).unwrap();
        let mut r = active();
        r.apply(ReservationTransition::Fulfill, now).unwrap();

        for t in [
            ReservationTransition::CancelByUser,
            ReservationTransition::CancelByAdmin,
            ReservationTransition::Expire,
            ReservationTransition::Fulfill,
        ] {
            assert_eq!(r.apply(t, now), Err(ReservationStatus::Fulfilled));
        }
        assert_eq!(r.fulfilled_at, Some(now));
        assert!(r.cancelled_at.is_none());
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let r = active();
        assert!(!r.is_past_deadline(r.pickup_deadline));
        assert!(r.is_past_deadline(r.pickup_deadline + Duration::seconds(1)));
    }
}
