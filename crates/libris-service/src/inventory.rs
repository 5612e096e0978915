//! Adding copies to and withdrawing them from circulation.

use std::sync::Arc;

use tracing::info;

use libris_core::clock::Clock;
use libris_core::error::{CirculationError, EntityKind};
use libris_core::result::CirculationResult;
use libris_core::types::{AuditAction, CopyId, PublicationId, UserId};
use libris_database::CirculationStore;
use libris_entity::{Copy, CopyStatus, NewCopy};

use crate::events::record_audit;

/// Manages the physical copies of publications.
#[derive(Debug, Clone)]
pub struct InventoryService {
    store: Arc<dyn CirculationStore>,
    clock: Arc<dyn Clock>,
}

impl InventoryService {
    /// Creates a new inventory service.
    pub fn new(store: Arc<dyn CirculationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Add an AVAILABLE copy of a publication.
    pub async fn add_copy(
        &self,
        publication_id: PublicationId,
        admin_id: UserId,
    ) -> CirculationResult<Copy> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        if tx.publication_title(publication_id).await?.is_none() {
            return Err(CirculationError::not_found(
                EntityKind::Publication,
                publication_id.get(),
            ));
        }
        let copy = tx
            .insert_copy(&NewCopy {
                publication_id,
                created_at: now,
            })
            .await?;
        record_audit(
            tx.as_mut(),
            admin_id,
            None,
            AuditAction::CopyCreated,
            Some(copy.id),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            copy_id = %copy.id,
            publication_id = %publication_id,
            inventory_code = %copy.inventory_code,
            "Copy added"
        );

        Ok(copy)
    }

    /// Withdraw a copy: UNAVAILABLE with a deletion timestamp.
    ///
    /// Only an AVAILABLE copy can be withdrawn. An unknown or already
    /// withdrawn copy is `NotFound`.
    pub async fn withdraw_copy(&self, copy_id: CopyId, admin_id: UserId) -> CirculationResult<Copy> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut copy = tx
            .lock_copy(copy_id)
            .await?
            .filter(|c| !c.is_deleted())
            .ok_or_else(|| CirculationError::not_found(EntityKind::Copy, copy_id.get()))?;

        if !copy.status.can_transition_to(CopyStatus::Unavailable)
            || !tx.soft_delete_copy(copy_id, now).await?
        {
            return Err(CirculationError::invalid_state(
                EntityKind::Copy,
                copy_id.get(),
                copy.status,
            ));
        }
        record_audit(
            tx.as_mut(),
            admin_id,
            None,
            AuditAction::CopyDeleted,
            Some(copy_id),
            now,
        )
        .await?;
        tx.commit().await?;

        copy.status = CopyStatus::Unavailable;
        copy.deleted_at = Some(now);
        copy.updated_at = now;

        info!(copy_id = %copy_id, "Copy withdrawn");

        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use libris_core::clock::ManualClock;
    use libris_database::{MemoryAuditLog, MemoryStore};
    use libris_entity::AccountStatus;

    use crate::policy::CirculationPolicy;
    use crate::reservation::ReservationService;

    fn opening_day() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
    }

    fn services(store: &MemoryStore) -> (InventoryService, ReservationService, MemoryAuditLog) {
        let clock = ManualClock::new(opening_day());
        let audit = store.audit_log();
        let inventory = InventoryService::new(Arc::new(store.clone()), Arc::new(clock.clone()));
        let reservations = ReservationService::new(
            Arc::new(store.clone()),
            Arc::new(clock),
            CirculationPolicy::default(),
        );
        (inventory, reservations, audit)
    }

    #[tokio::test]
    async fn test_add_copy_assigns_inventory_code() {
        let store = MemoryStore::new();
        let (inventory, _, audit) = services(&store);
        let admin = store.add_user(AccountStatus::Active).await;
        let publication = store.add_publication("Fiasco", opening_day()).await;

        let copy = inventory.add_copy(publication, admin).await.unwrap();
        assert_eq!(copy.status, CopyStatus::Available);
        assert_eq!(copy.inventory_code, format!("LIB-2025-{:06}", copy.id.get()));
        let records = audit.records().await;
        assert_eq!(records[0].action, AuditAction::CopyCreated);
        assert_eq!(records[0].action.as_str(), "COPY_CREATED");
    }

    #[tokio::test]
    async fn test_add_copy_to_unknown_publication() {
        let store = MemoryStore::new();
        let (inventory, _, _) = services(&store);
        let err = inventory
            .add_copy(PublicationId(77), UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CirculationError::NotFound {
                entity: EntityKind::Publication,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_withdraw_reserved_copy_is_rejected() {
        let store = MemoryStore::new();
        let (inventory, reservations, _) = services(&store);
        let admin = store.add_user(AccountStatus::Active).await;
        let user = store.add_user(AccountStatus::Active).await;
        let publication = store.add_publication("Fiasco", opening_day()).await;
        let copy = inventory.add_copy(publication, admin).await.unwrap();
        reservations.create(user, publication).await.unwrap();

        let err = inventory.withdraw_copy(copy.id, admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_withdrawn_copy_is_not_allocatable() {
        let store = MemoryStore::new();
        let (inventory, reservations, _) = services(&store);
        let admin = store.add_user(AccountStatus::Active).await;
        let user = store.add_user(AccountStatus::Active).await;
        let publication = store.add_publication("Fiasco", opening_day()).await;
        let copy = inventory.add_copy(publication, admin).await.unwrap();

        let withdrawn = inventory.withdraw_copy(copy.id, admin).await.unwrap();
        assert_eq!(withdrawn.status, CopyStatus::Unavailable);
        assert!(withdrawn.deleted_at.is_some());

        let err = inventory.withdraw_copy(copy.id, admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::NotFound { .. }));

        let err = reservations.create(user, publication).await.unwrap_err();
        assert!(matches!(err, CirculationError::NoCopyAvailable { .. }));
    }
}
