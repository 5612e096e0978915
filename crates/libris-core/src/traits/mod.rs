//! Collaborator traits defined in `libris-core` and implemented by other crates.

pub mod notifier;

pub use notifier::Notifier;
