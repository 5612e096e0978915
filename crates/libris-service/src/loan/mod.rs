//! Loan lifecycle: issuance from a reservation and return.

pub mod service;

pub use service::LoanService;
