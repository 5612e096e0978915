//! Reservation creation, cancellation and expiry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use libris_core::clock::Clock;
use libris_core::error::{CirculationError, EntityKind};
use libris_core::result::CirculationResult;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{AuditAction, PublicationId, ReservationId, UserId};
use libris_database::{CirculationStore, CirculationTx};
use libris_entity::{CopyStatus, NewReservation, Reservation, ReservationTransition};

use super::transition::apply_transition;
use crate::allocator::CopyAllocator;
use crate::events::record_audit;
use crate::invariants;
use crate::policy::CirculationPolicy;

/// Drives reservations through ACTIVE and into one terminal state.
#[derive(Debug, Clone)]
pub struct ReservationService {
    /// Entity store.
    store: Arc<dyn CirculationStore>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Circulation rules.
    policy: CirculationPolicy,
    /// Copy allocator.
    allocator: CopyAllocator,
}

impl ReservationService {
    /// Creates a new reservation service.
    pub fn new(
        store: Arc<dyn CirculationStore>,
        clock: Arc<dyn Clock>,
        policy: CirculationPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            allocator: CopyAllocator::new(),
        }
    }

    /// Reserve a copy of `publication_id` for `user_id`.
    ///
    /// Standing, limit, allocation, the copy's move to RESERVED and the
    /// insert all happen in one transaction; any failure leaves the copy
    /// AVAILABLE.
    pub async fn create(
        &self,
        user_id: UserId,
        publication_id: PublicationId,
    ) -> CirculationResult<Reservation> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        invariants::ensure_can_reserve(tx.as_mut(), user_id, &self.policy).await?;
        let copy = self.allocator.allocate(tx.as_mut(), publication_id).await?;

        if !tx
            .set_copy_status(copy.id, CopyStatus::Available, CopyStatus::Reserved, now)
            .await?
        {
            return Err(CirculationError::invalid_state(
                EntityKind::Copy,
                copy.id.get(),
                copy.status,
            ));
        }

        let reservation = tx
            .insert_reservation(&NewReservation {
                user_id,
                copy_id: copy.id,
                reserved_at: now,
                pickup_deadline: self.policy.pickup_deadline(now),
            })
            .await?;
        record_audit(
            tx.as_mut(),
            user_id,
            Some(user_id),
            AuditAction::ReservationCreated,
            Some(copy.id),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            user_id = %user_id,
            copy_id = %copy.id,
            pickup_deadline = %reservation.pickup_deadline,
            "Reservation created"
        );
        Ok(reservation)
    }

    /// Cancel a reservation on behalf of the user who made it.
    ///
    /// A reservation belonging to someone else is reported as `NotFound`.
    pub async fn cancel_by_user(
        &self,
        reservation_id: ReservationId,
        user_id: UserId,
    ) -> CirculationResult<Reservation> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut reservation = tx
            .lock_reservation(reservation_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| {
                CirculationError::not_found(EntityKind::Reservation, reservation_id.get())
            })?;

        apply_transition(
            tx.as_mut(),
            &mut reservation,
            ReservationTransition::CancelByUser,
            now,
        )
        .await?;
        record_audit(
            tx.as_mut(),
            user_id,
            Some(user_id),
            AuditAction::ReservationCancelled,
            Some(reservation.copy_id),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            user_id = %user_id,
            copy_id = %reservation.copy_id,
            "Reservation cancelled by user"
        );
        Ok(reservation)
    }

    /// Cancel any ACTIVE reservation as staff.
    pub async fn cancel_by_admin(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
    ) -> CirculationResult<Reservation> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut reservation = tx.lock_reservation(reservation_id).await?.ok_or_else(|| {
            CirculationError::not_found(EntityKind::Reservation, reservation_id.get())
        })?;

        apply_transition(
            tx.as_mut(),
            &mut reservation,
            ReservationTransition::CancelByAdmin,
            now,
        )
        .await?;
        record_audit(
            tx.as_mut(),
            admin_id,
            Some(reservation.user_id),
            AuditAction::ReservationCancelledByAdmin,
            Some(reservation.copy_id),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            reservation_id = %reservation.id,
            admin_id = %admin_id,
            user_id = %reservation.user_id,
            copy_id = %reservation.copy_id,
            "Reservation cancelled by admin"
        );
        Ok(reservation)
    }

    /// Expire one reservation already locked in `tx`.
    ///
    /// The caller commits; used by loan issuance when the pickup deadline
    /// has passed.
    pub async fn expire_one(
        tx: &mut dyn CirculationTx,
        reservation: &mut Reservation,
        now: DateTime<Utc>,
    ) -> CirculationResult<()> {
        apply_transition(tx, reservation, ReservationTransition::Expire, now).await?;
        debug!(
            reservation_id = %reservation.id,
            copy_id = %reservation.copy_id,
            "Reservation expired"
        );
        Ok(())
    }

    /// Expire every ACTIVE reservation whose pickup deadline has passed and
    /// free its copy, as one atomic bulk operation.
    pub async fn expire_overdue(&self) -> CirculationResult<Vec<Reservation>> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let expired = tx.expire_overdue_reservations(now).await?;
        tx.commit().await?;

        for reservation in &expired {
            debug!(
                reservation_id = %reservation.id,
                user_id = %reservation.user_id,
                copy_id = %reservation.copy_id,
                "Reservation expired by sweep"
            );
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "Overdue reservations expired");
        }
        Ok(expired)
    }

    /// Find a reservation by id.
    pub async fn find(&self, reservation_id: ReservationId) -> CirculationResult<Reservation> {
        self.store
            .find_reservation(reservation_id)
            .await?
            .ok_or_else(|| CirculationError::not_found(EntityKind::Reservation, reservation_id.get()))
    }

    /// All ACTIVE reservations, newest first.
    pub async fn list_active(
        &self,
        page: &PageRequest,
    ) -> CirculationResult<PageResponse<Reservation>> {
        Ok(self.store.active_reservations(page).await?)
    }

    /// A user's ACTIVE reservations, newest first.
    pub async fn list_active_for_user(&self, user_id: UserId) -> CirculationResult<Vec<Reservation>> {
        Ok(self.store.active_reservations_for_user(user_id).await?)
    }
}
