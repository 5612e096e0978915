//! # libris-entity
//!
//! Domain entity models for the Libris circulation engine. Every struct in
//! this crate is a database row or a value used to insert one. The status
//! enums carry the explicit state machines for copies and reservations:
//! each legal transition is named, with its pre-state and post-state.

pub mod audit;
pub mod copy;
pub mod loan;
pub mod message;
pub mod publication;
pub mod reservation;
pub mod user;

pub use audit::AuditEntry;
pub use copy::{Copy, CopyStatus, NewCopy};
pub use loan::{Loan, LoanDetails, NewLoan};
pub use message::Message;
pub use publication::Publication;
pub use reservation::{NewReservation, Reservation, ReservationStatus, ReservationTransition};
pub use user::{AccountStatus, UserStanding};
