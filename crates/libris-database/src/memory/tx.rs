//! In-memory transaction.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use libris_core::error::AppError;
use libris_core::result::AppResult;
use libris_core::types::audit::AuditRecord;
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_entity::{
    Copy, CopyStatus, Loan, NewCopy, NewLoan, NewReservation, Reservation, ReservationStatus,
    ReservationTransition, UserStanding,
};

use super::Tables;
use crate::store::CirculationTx;

/// Holds the table lock and a working copy of every table.
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    audit_failing: Arc<AtomicBool>,
}

impl MemoryTx {
    pub(super) fn new(guard: OwnedMutexGuard<Tables>, audit_failing: Arc<AtomicBool>) -> Self {
        let working = guard.clone();
        Self {
            guard,
            working,
            audit_failing,
        }
    }
}

#[async_trait]
impl CirculationTx for MemoryTx {
    async fn lock_user(&mut self, user_id: UserId) -> AppResult<Option<UserStanding>> {
        Ok(self.working.users.get(&user_id).cloned())
    }

    async fn count_active_items(&mut self, user_id: UserId) -> AppResult<u32> {
        Ok(u32::try_from(self.working.active_item_count(user_id)).unwrap_or(u32::MAX))
    }

    async fn lock_available_copy(
        &mut self,
        publication_id: PublicationId,
    ) -> AppResult<Option<Copy>> {
        // BTreeMap iterates in ascending id order.
        Ok(self
            .working
            .copies
            .values()
            .find(|c| c.publication_id == publication_id && c.is_allocatable())
            .cloned())
    }

    async fn lock_copy(&mut self, copy_id: CopyId) -> AppResult<Option<Copy>> {
        Ok(self.working.copies.get(&copy_id).cloned())
    }

    async fn set_copy_status(
        &mut self,
        copy_id: CopyId,
        from: CopyStatus,
        to: CopyStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        match self.working.copies.get_mut(&copy_id) {
            Some(copy) if copy.status == from && !copy.is_deleted() => {
                copy.status = to;
                copy.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn soft_delete_copy(&mut self, copy_id: CopyId, now: DateTime<Utc>) -> AppResult<bool> {
        match self.working.copies.get_mut(&copy_id) {
            Some(copy) if copy.is_allocatable() => {
                copy.status = CopyStatus::Unavailable;
                copy.deleted_at = Some(now);
                copy.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_copy(&mut self, data: &NewCopy) -> AppResult<Copy> {
        if !self.working.publications.contains_key(&data.publication_id) {
            return Err(AppError::database(format!(
                "Publication {} does not exist",
                data.publication_id
            )));
        }
        Ok(self.working.new_copy(data.publication_id, data.created_at))
    }

    async fn publication_title(
        &mut self,
        publication_id: PublicationId,
    ) -> AppResult<Option<String>> {
        Ok(self
            .working
            .publications
            .get(&publication_id)
            .map(|p| p.title.clone()))
    }

    async fn insert_reservation(&mut self, data: &NewReservation) -> AppResult<Reservation> {
        let taken = self
            .working
            .reservations
            .values()
            .any(|r| r.copy_id == data.copy_id && r.status == ReservationStatus::Active);
        if taken {
            return Err(AppError::conflict(format!(
                "Copy {} already has an active reservation",
                data.copy_id
            )));
        }

        let id = ReservationId(self.working.next_id());
        let reservation = Reservation {
            id,
            user_id: data.user_id,
            copy_id: data.copy_id,
            reserved_at: data.reserved_at,
            pickup_deadline: data.pickup_deadline,
            status: ReservationStatus::Active,
            cancelled_at: None,
            expired_at: None,
            fulfilled_at: None,
        };
        self.working.reservations.insert(id, reservation.clone());
        Ok(reservation)
    }

    async fn lock_reservation(&mut self, id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.working.reservations.get(&id).cloned())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<bool> {
        match self.working.reservations.get_mut(&reservation.id) {
            Some(stored) if stored.status == ReservationStatus::Active => {
                *stored = reservation.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_overdue_reservations(
        &mut self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        let mut expired = Vec::new();
        for reservation in self.working.reservations.values_mut() {
            if reservation.is_past_deadline(now)
                && reservation.apply(ReservationTransition::Expire, now).is_ok()
            {
                expired.push(reservation.clone());
            }
        }

        for reservation in &expired {
            if let Some(copy) = self.working.copies.get_mut(&reservation.copy_id) {
                if copy.status == CopyStatus::Reserved {
                    copy.status = CopyStatus::Available;
                    copy.updated_at = now;
                }
            }
        }
        Ok(expired)
    }

    async fn insert_loan(&mut self, data: &NewLoan) -> AppResult<Loan> {
        let duplicate = self
            .working
            .loans
            .values()
            .any(|l| l.reservation_id == data.reservation_id);
        if duplicate {
            return Err(AppError::conflict(format!(
                "Reservation {} already has a loan",
                data.reservation_id
            )));
        }

        let id = LoanId(self.working.next_id());
        let loan = Loan {
            id,
            reservation_id: data.reservation_id,
            copy_id: data.copy_id,
            user_id: data.user_id,
            loaned_at: data.loaned_at,
            due_at: data.due_at,
            returned_at: None,
        };
        self.working.loans.insert(id, loan.clone());
        Ok(loan)
    }

    async fn lock_loan(&mut self, id: LoanId) -> AppResult<Option<Loan>> {
        Ok(self.working.loans.get(&id).cloned())
    }

    async fn mark_loan_returned(&mut self, id: LoanId, at: DateTime<Utc>) -> AppResult<bool> {
        match self.working.loans.get_mut(&id) {
            Some(loan) if loan.is_outstanding() => {
                loan.returned_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_audit(&mut self, record: &AuditRecord) -> AppResult<()> {
        if self.audit_failing.load(Ordering::SeqCst) {
            return Err(AppError::service_unavailable("Audit log is unavailable"));
        }
        self.working.audit.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}
