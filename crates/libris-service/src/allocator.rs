//! Copy allocation under contention.
//!
//! The allocator claims the lowest-id AVAILABLE, non-deleted copy of a
//! publication and leaves it locked for the rest of the caller's
//! transaction. Rows already locked by a concurrent claimant are skipped
//! rather than waited on, so requests for different copies of the same
//! publication proceed in parallel. Allocation has no side effect: the
//! caller moves the copy to RESERVED in the same transaction.

use tracing::debug;

use libris_core::error::CirculationError;
use libris_core::result::CirculationResult;
use libris_core::types::PublicationId;
use libris_database::CirculationTx;
use libris_entity::Copy;

/// Finds and exclusively claims one copy of a publication.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyAllocator;

impl CopyAllocator {
    /// Creates a new allocator.
    pub fn new() -> Self {
        Self
    }

    /// Claim a copy of `publication_id` inside `tx`.
    ///
    /// Fails with [`CirculationError::NoCopyAvailable`] when every eligible
    /// copy is either taken or locked by another in-flight transaction.
    pub async fn allocate(
        &self,
        tx: &mut dyn CirculationTx,
        publication_id: PublicationId,
    ) -> CirculationResult<Copy> {
        match tx.lock_available_copy(publication_id).await? {
            Some(copy) => {
                debug!(
                    publication_id = %publication_id,
                    copy_id = %copy.id,
                    "Copy claimed"
                );
                Ok(copy)
            }
            None => {
                debug!(publication_id = %publication_id, "No copy available");
                Err(CirculationError::NoCopyAvailable {
                    publication_id: publication_id.get(),
                })
            }
        }
    }
}
