//! Reservation state machine.

pub mod service;
pub mod transition;

pub use service::ReservationService;
pub use transition::apply_transition;
