//! # libris-service
//!
//! The circulation engine. Each service owns one part of the
//! Copy x Reservation x Loan state machine and runs every decision inside
//! a single store transaction: current state is re-read under lock,
//! checked, and mutated before commit. Audit entries are written in
//! the same transaction; user notifications are sent after commit and
//! never undo a committed change.
//!
//! Services follow constructor injection: the store, the clock, the
//! policy and the notifier are provided at construction time via
//! `Arc` references. [`CirculationService`] bundles them behind the
//! operations thin controllers call.

pub mod allocator;
pub mod circulation;
pub mod events;
pub mod inventory;
pub mod invariants;
pub mod loan;
pub mod notification;
pub mod policy;
pub mod reservation;

pub use allocator::CopyAllocator;
pub use circulation::CirculationService;
pub use events::CirculationEvents;
pub use inventory::InventoryService;
pub use loan::LoanService;
pub use notification::{LoanReminderService, NotificationRules, ReminderSummary};
pub use policy::CirculationPolicy;
pub use reservation::ReservationService;
