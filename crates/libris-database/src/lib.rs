//! # libris-database
//!
//! The entity store behind the circulation engine. [`store`] defines the
//! transactional contract; [`postgres`] implements it with PostgreSQL row
//! locks and [`memory`] with a single in-process lock for single-node
//! deployments and tests. The repositories persist user messages and the
//! audit log.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryAuditLog, MemoryNotifier, MemoryStore};
pub use postgres::PgCirculationStore;
pub use repositories::{AuditLogRepository, MessageRepository};
pub use store::{CirculationStore, CirculationTx};
