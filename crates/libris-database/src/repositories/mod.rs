//! Repositories for the collaborator tables: user messages and the audit log.

pub mod audit;
pub mod message;

pub use audit::AuditLogRepository;
pub use message::MessageRepository;
