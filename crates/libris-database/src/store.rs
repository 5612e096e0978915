//! Transactional entity store contract.
//!
//! Every circulation decision runs inside one [`CirculationTx`]: current
//! state is re-read under lock, checked, and mutated before `commit`.
//! Dropping a transaction without committing rolls it back.
//!
//! Lock semantics each implementation must honour:
//! - [`CirculationTx::lock_available_copy`] is acquire-or-skip: a row
//!   locked by another in-flight transaction is passed over, never waited on.
//! - every other `lock_*` method blocks until the row is free or the
//!   store's lock timeout elapses, which surfaces as an `AppError` of kind
//!   `Contention`.
//! - guarded writes (`update_reservation`, `set_copy_status`,
//!   `mark_loan_returned`, `soft_delete_copy`) return `false` instead of
//!   writing when the row is no longer in the expected pre-state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use libris_core::result::AppResult;
use libris_core::types::audit::AuditRecord;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_entity::{
    Copy, CopyStatus, Loan, LoanDetails, NewCopy, NewLoan, NewReservation, Reservation,
    UserStanding,
};

/// One open store transaction.
#[async_trait]
pub trait CirculationTx: Send {
    /// Read the user's standing and lock the user row until commit.
    ///
    /// Holding this lock serialises concurrent reservation attempts by the
    /// same user, so the active-item count read afterwards stays valid.
    async fn lock_user(&mut self, user_id: UserId) -> AppResult<Option<UserStanding>>;

    /// Live count of the user's ACTIVE reservations plus outstanding loans.
    async fn count_active_items(&mut self, user_id: UserId) -> AppResult<u32>;

    /// Claim the lowest-id AVAILABLE, non-deleted copy of `publication_id`,
    /// skipping rows locked by other transactions.
    async fn lock_available_copy(
        &mut self,
        publication_id: PublicationId,
    ) -> AppResult<Option<Copy>>;

    /// Lock a copy by id.
    async fn lock_copy(&mut self, copy_id: CopyId) -> AppResult<Option<Copy>>;

    /// Move a copy from `from` to `to`.
    async fn set_copy_status(
        &mut self,
        copy_id: CopyId,
        from: CopyStatus,
        to: CopyStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Withdraw an AVAILABLE copy: UNAVAILABLE with `deleted_at = now`.
    async fn soft_delete_copy(&mut self, copy_id: CopyId, now: DateTime<Utc>) -> AppResult<bool>;

    /// Insert an AVAILABLE copy and assign its inventory code.
    async fn insert_copy(&mut self, data: &NewCopy) -> AppResult<Copy>;

    /// Title of a publication, if it exists.
    async fn publication_title(&mut self, publication_id: PublicationId)
    -> AppResult<Option<String>>;

    /// Insert an ACTIVE reservation.
    async fn insert_reservation(&mut self, data: &NewReservation) -> AppResult<Reservation>;

    /// Lock a reservation by id.
    async fn lock_reservation(&mut self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Persist a transition already applied to `reservation`, provided the
    /// stored row is still ACTIVE.
    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<bool>;

    /// Expire every ACTIVE reservation whose pickup deadline is before
    /// `now`, release each one's RESERVED copy back to AVAILABLE, and
    /// return the reservations it changed.
    ///
    /// Rows locked by in-flight transactions are skipped; the next sweep
    /// picks up whichever of them are still ACTIVE.
    async fn expire_overdue_reservations(&mut self, now: DateTime<Utc>)
    -> AppResult<Vec<Reservation>>;

    /// Insert a loan.
    async fn insert_loan(&mut self, data: &NewLoan) -> AppResult<Loan>;

    /// Lock a loan by id.
    async fn lock_loan(&mut self, id: LoanId) -> AppResult<Option<Loan>>;

    /// Set `returned_at` on a loan that has none yet.
    async fn mark_loan_returned(&mut self, id: LoanId, at: DateTime<Utc>) -> AppResult<bool>;

    /// Append an audit record. It becomes visible only if the transaction
    /// commits, and a failed write must abort the surrounding operation.
    async fn record_audit(&mut self, record: &AuditRecord) -> AppResult<()>;

    /// Make every change in this transaction durable.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}

/// Entry point to the entity store.
#[async_trait]
pub trait CirculationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Open a transaction.
    async fn begin(&self) -> AppResult<Box<dyn CirculationTx>>;

    /// Find a copy by id.
    async fn find_copy(&self, id: CopyId) -> AppResult<Option<Copy>>;

    /// Find a reservation by id.
    async fn find_reservation(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Find a loan by id.
    async fn find_loan(&self, id: LoanId) -> AppResult<Option<Loan>>;

    /// All ACTIVE reservations, newest first.
    async fn active_reservations(&self, page: &PageRequest)
    -> AppResult<PageResponse<Reservation>>;

    /// A user's ACTIVE reservations, newest first.
    async fn active_reservations_for_user(&self, user_id: UserId) -> AppResult<Vec<Reservation>>;

    /// All outstanding loans, earliest due first.
    async fn outstanding_loans(&self, page: &PageRequest) -> AppResult<PageResponse<Loan>>;

    /// A user's outstanding loans, most recent first.
    async fn outstanding_loans_for_user(&self, user_id: UserId) -> AppResult<Vec<Loan>>;

    /// Outstanding loans with `from <= due_at < to`, earliest due first.
    async fn outstanding_loans_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<LoanDetails>>;

    /// Whether any AVAILABLE, non-deleted copy of the publication exists.
    async fn has_available_copy(&self, publication_id: PublicationId) -> AppResult<bool>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
