//! Core type definitions used across the Libris workspace.

pub mod audit;
pub mod id;
pub mod message;
pub mod pagination;

pub use audit::{AuditAction, AuditRecord};
pub use id::*;
pub use message::{MessageKind, Notification};
pub use pagination::{PageRequest, PageResponse};
