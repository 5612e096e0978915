//! The circulation facade called by controllers, jobs and the CLI.

use std::sync::Arc;

use tracing::error;

use libris_core::clock::Clock;
use libris_core::result::CirculationResult;
use libris_core::traits::Notifier;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_database::CirculationStore;
use libris_entity::{Copy, Loan, Reservation};

use crate::events::CirculationEvents;
use crate::inventory::InventoryService;
use crate::loan::LoanService;
use crate::notification::{LoanReminderService, ReminderSummary};
use crate::policy::CirculationPolicy;
use crate::reservation::ReservationService;

/// Every circulation operation behind one handle.
#[derive(Debug, Clone)]
pub struct CirculationService {
    store: Arc<dyn CirculationStore>,
    reservations: ReservationService,
    loans: LoanService,
    inventory: InventoryService,
    reminders: LoanReminderService,
}

impl CirculationService {
    /// Wire the engine over a store, a clock and the notifier.
    pub fn new(
        store: Arc<dyn CirculationStore>,
        clock: Arc<dyn Clock>,
        policy: CirculationPolicy,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = CirculationEvents::new(notifier);
        Self {
            reservations: ReservationService::new(store.clone(), clock.clone(), policy),
            loans: LoanService::new(store.clone(), clock.clone(), policy, events.clone()),
            inventory: InventoryService::new(store.clone(), clock.clone()),
            reminders: LoanReminderService::new(store.clone(), clock, policy, events),
            store,
        }
    }

    /// The reservation service.
    pub fn reservations(&self) -> &ReservationService {
        &self.reservations
    }

    /// The loan service.
    pub fn loans(&self) -> &LoanService {
        &self.loans
    }

    /// The inventory service.
    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    /// Reserve a copy of a publication for a user.
    pub async fn reserve(
        &self,
        user_id: UserId,
        publication_id: PublicationId,
    ) -> CirculationResult<Reservation> {
        self.reservations.create(user_id, publication_id).await
    }

    /// Cancel the caller's own reservation.
    pub async fn cancel_by_user(
        &self,
        reservation_id: ReservationId,
        user_id: UserId,
    ) -> CirculationResult<Reservation> {
        self.reservations
            .cancel_by_user(reservation_id, user_id)
            .await
    }

    /// Cancel a reservation as staff.
    pub async fn cancel_by_admin(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
    ) -> CirculationResult<Reservation> {
        self.reservations
            .cancel_by_admin(reservation_id, admin_id)
            .await
    }

    /// Turn an ACTIVE reservation into a loan.
    pub async fn issue_loan(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
    ) -> CirculationResult<Loan> {
        self.loans.issue(reservation_id, admin_id).await
    }

    /// Accept a return. Repeating the call is a no-op.
    pub async fn accept_return(&self, loan_id: LoanId, admin_id: UserId) -> CirculationResult<Loan> {
        self.loans.accept_return(loan_id, admin_id).await
    }

    /// Expire overdue reservations and return how many were expired.
    ///
    /// Failures are logged, never returned; the next sweep retries.
    pub async fn sweep_expired(&self) -> usize {
        match self.reservations.expire_overdue().await {
            Ok(expired) => expired.len(),
            Err(e) => {
                error!(error = %e, retryable = e.is_retryable(), "Expiry sweep failed");
                0
            }
        }
    }

    /// Send today's DUE_SOON and OVERDUE reminders.
    pub async fn send_loan_reminders(&self) -> CirculationResult<ReminderSummary> {
        self.reminders.run().await
    }

    /// Whether a publication has a copy a reservation could claim right now.
    pub async fn can_reserve(&self, publication_id: PublicationId) -> CirculationResult<bool> {
        Ok(self.store.has_available_copy(publication_id).await?)
    }

    /// All ACTIVE reservations, newest first.
    pub async fn active_reservations(
        &self,
        page: &PageRequest,
    ) -> CirculationResult<PageResponse<Reservation>> {
        self.reservations.list_active(page).await
    }

    /// A user's ACTIVE reservations.
    pub async fn user_reservations(&self, user_id: UserId) -> CirculationResult<Vec<Reservation>> {
        self.reservations.list_active_for_user(user_id).await
    }

    /// All outstanding loans, earliest due first.
    pub async fn outstanding_loans(&self, page: &PageRequest) -> CirculationResult<PageResponse<Loan>> {
        self.loans.list_outstanding(page).await
    }

    /// A user's outstanding loans.
    pub async fn user_loans(&self, user_id: UserId) -> CirculationResult<Vec<Loan>> {
        self.loans.list_outstanding_for_user(user_id).await
    }

    /// Add a copy of a publication.
    pub async fn add_copy(
        &self,
        publication_id: PublicationId,
        admin_id: UserId,
    ) -> CirculationResult<Copy> {
        self.inventory.add_copy(publication_id, admin_id).await
    }

    /// Withdraw an AVAILABLE copy.
    pub async fn withdraw_copy(&self, copy_id: CopyId, admin_id: UserId) -> CirculationResult<Copy> {
        self.inventory.withdraw_copy(copy_id, admin_id).await
    }

    /// Whether the store is reachable.
    pub async fn health_check(&self) -> CirculationResult<bool> {
        Ok(self.store.health_check().await?)
    }
}
