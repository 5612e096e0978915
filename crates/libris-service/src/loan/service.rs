//! Loan issuance and return acceptance.

use std::sync::Arc;

use tracing::{debug, info};

use libris_core::clock::Clock;
use libris_core::error::{CirculationError, EntityKind};
use libris_core::result::CirculationResult;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{AuditAction, LoanId, ReservationId, UserId};
use libris_database::CirculationStore;
use libris_entity::{CopyStatus, Loan, NewLoan, ReservationStatus, ReservationTransition};

use crate::events::{CirculationEvents, record_audit};
use crate::notification::NotificationRules;
use crate::policy::CirculationPolicy;
use crate::reservation::{ReservationService, apply_transition};

/// Converts reservations into loans and takes copies back.
#[derive(Debug, Clone)]
pub struct LoanService {
    store: Arc<dyn CirculationStore>,
    clock: Arc<dyn Clock>,
    policy: CirculationPolicy,
    events: CirculationEvents,
}

impl LoanService {
    /// Creates a new loan service.
    pub fn new(
        store: Arc<dyn CirculationStore>,
        clock: Arc<dyn Clock>,
        policy: CirculationPolicy,
        events: CirculationEvents,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            events,
        }
    }

    /// Hand the reserved copy to the user.
    ///
    /// The pickup deadline is inclusive. Past it, the reservation is
    /// expired and committed, its copy freed, and the call fails with
    /// [`CirculationError::ReservationExpired`]; no loan is created.
    pub async fn issue(
        &self,
        reservation_id: ReservationId,
        admin_id: UserId,
    ) -> CirculationResult<Loan> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut reservation = tx.lock_reservation(reservation_id).await?.ok_or_else(|| {
            CirculationError::not_found(EntityKind::Reservation, reservation_id.get())
        })?;

        if reservation.status != ReservationStatus::Active {
            return Err(CirculationError::invalid_state(
                EntityKind::Reservation,
                reservation_id.get(),
                reservation.status,
            ));
        }

        if reservation.is_past_deadline(now) {
            ReservationService::expire_one(tx.as_mut(), &mut reservation, now).await?;
            record_audit(
                tx.as_mut(),
                admin_id,
                Some(reservation.user_id),
                AuditAction::ReservationExpired,
                Some(reservation.copy_id),
                now,
            )
            .await?;
            tx.commit().await?;

            info!(
                reservation_id = %reservation.id,
                user_id = %reservation.user_id,
                copy_id = %reservation.copy_id,
                pickup_deadline = %reservation.pickup_deadline,
                "Reservation expired at pickup"
            );

            return Err(CirculationError::ReservationExpired {
                reservation_id: reservation_id.get(),
            });
        }

        let copy = tx
            .lock_copy(reservation.copy_id)
            .await?
            .ok_or_else(|| CirculationError::not_found(EntityKind::Copy, reservation.copy_id.get()))?;
        let title = tx
            .publication_title(copy.publication_id)
            .await?
            .ok_or_else(|| {
                CirculationError::not_found(EntityKind::Publication, copy.publication_id.get())
            })?;

        apply_transition(
            tx.as_mut(),
            &mut reservation,
            ReservationTransition::Fulfill,
            now,
        )
        .await?;
        let loan = tx
            .insert_loan(&NewLoan {
                reservation_id: reservation.id,
                copy_id: copy.id,
                user_id: reservation.user_id,
                loaned_at: now,
                due_at: self.policy.due_at(now),
            })
            .await?;
        record_audit(
            tx.as_mut(),
            admin_id,
            Some(loan.user_id),
            AuditAction::LoanCreated,
            Some(copy.id),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            loan_id = %loan.id,
            reservation_id = %reservation.id,
            user_id = %loan.user_id,
            copy_id = %copy.id,
            due_at = %loan.due_at,
            "Loan issued"
        );
        self.events
            .notify(NotificationRules::loan_created(
                &loan,
                &title,
                &copy.inventory_code,
            ))
            .await;

        Ok(loan)
    }

    /// Accept a returned copy.
    ///
    /// Idempotent: a loan that is already returned is handed back as is,
    /// with its original `returned_at` and no second audit entry.
    pub async fn accept_return(&self, loan_id: LoanId, admin_id: UserId) -> CirculationResult<Loan> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;

        let mut loan = tx
            .lock_loan(loan_id)
            .await?
            .ok_or_else(|| CirculationError::not_found(EntityKind::Loan, loan_id.get()))?;

        if !loan.is_outstanding() {
            debug!(loan_id = %loan_id, "Loan already returned");
            return Ok(loan);
        }

        if !tx.mark_loan_returned(loan_id, now).await? {
            return Err(CirculationError::invalid_state(
                EntityKind::Loan,
                loan_id.get(),
                "returned",
            ));
        }
        if !tx
            .set_copy_status(loan.copy_id, CopyStatus::Loaned, CopyStatus::Available, now)
            .await?
        {
            let status = match tx.lock_copy(loan.copy_id).await? {
                Some(copy) => copy.status.to_string(),
                None => "missing".to_string(),
            };
            return Err(CirculationError::invalid_state(
                EntityKind::Copy,
                loan.copy_id.get(),
                status,
            ));
        }
        record_audit(
            tx.as_mut(),
            admin_id,
            Some(loan.user_id),
            AuditAction::LoanReturned,
            Some(loan.copy_id),
            now,
        )
        .await?;
        tx.commit().await?;
        loan.returned_at = Some(now);

        info!(
            loan_id = %loan.id,
            user_id = %loan.user_id,
            copy_id = %loan.copy_id,
            "Loan returned"
        );
        Ok(loan)
    }

    /// Find a loan by id.
    pub async fn find(&self, loan_id: LoanId) -> CirculationResult<Loan> {
        self.store
            .find_loan(loan_id)
            .await?
            .ok_or_else(|| CirculationError::not_found(EntityKind::Loan, loan_id.get()))
    }

    /// All outstanding loans, earliest due first.
    pub async fn list_outstanding(&self, page: &PageRequest) -> CirculationResult<PageResponse<Loan>> {
        Ok(self.store.outstanding_loans(page).await?)
    }

    /// A user's outstanding loans, most recent first.
    pub async fn list_outstanding_for_user(&self, user_id: UserId) -> CirculationResult<Vec<Loan>> {
        Ok(self.store.outstanding_loans_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use libris_core::clock::ManualClock;
    use libris_core::types::MessageKind;
    use libris_database::{MemoryAuditLog, MemoryNotifier, MemoryStore};
    use libris_entity::AccountStatus;

    struct Fixture {
        store: MemoryStore,
        clock: ManualClock,
        notifier: MemoryNotifier,
        audit: MemoryAuditLog,
        reservations: ReservationService,
        loans: LoanService,
        admin: UserId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap());
        let notifier = MemoryNotifier::new();
        let audit = store.audit_log();
        let events = CirculationEvents::new(Arc::new(notifier.clone()));
        let policy = CirculationPolicy::default();
        let reservations = ReservationService::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            policy,
        );
        let loans = LoanService::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            policy,
            events,
        );
        let admin = store.add_user(AccountStatus::Active).await;
        Fixture {
            store,
            clock,
            notifier,
            audit,
            reservations,
            loans,
            admin,
        }
    }

    #[tokio::test]
    async fn test_issue_notifies_with_loan_details() {
        let f = fixture().await;
        let user = f.store.add_user(AccountStatus::Active).await;
        let publication = f.store.add_publication("The Invincible", f.clock.now()).await;
        let copy = f.store.add_copy(publication, f.clock.now()).await.unwrap();
        let reservation = f.reservations.create(user, publication).await.unwrap();

        let loan = f.loans.issue(reservation.id, f.admin).await.unwrap();
        assert_eq!(loan.due_at, f.clock.now() + Duration::days(30));

        let sent = f.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, MessageKind::LoanCreated);
        assert!(sent[0].body.contains("The Invincible"));
        assert!(sent[0].body.contains(&copy.inventory_code));
        assert!(sent[0].body.contains("2025-05-01"));
    }

    #[tokio::test]
    async fn test_issue_on_fulfilled_reservation_is_invalid_state() {
        let f = fixture().await;
        let user = f.store.add_user(AccountStatus::Active).await;
        let publication = f.store.add_publication("The Invincible", f.clock.now()).await;
        f.store.add_copy(publication, f.clock.now()).await.unwrap();
        let reservation = f.reservations.create(user, publication).await.unwrap();

        f.loans.issue(reservation.id, f.admin).await.unwrap();
        let err = f.loans.issue(reservation.id, f.admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_already_expired_is_invalid_state_not_reservation_expired() {
        let f = fixture().await;
        let user = f.store.add_user(AccountStatus::Active).await;
        let publication = f.store.add_publication("The Invincible", f.clock.now()).await;
        f.store.add_copy(publication, f.clock.now()).await.unwrap();
        let reservation = f.reservations.create(user, publication).await.unwrap();

        f.clock.advance(Duration::days(4));
        let err = f.loans.issue(reservation.id, f.admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::ReservationExpired { .. }));

        let err = f.loans.issue(reservation.id, f.admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_undo_loan() {
        let f = fixture().await;
        let user = f.store.add_user(AccountStatus::Active).await;
        let publication = f.store.add_publication("The Invincible", f.clock.now()).await;
        let copy = f.store.add_copy(publication, f.clock.now()).await.unwrap();
        let reservation = f.reservations.create(user, publication).await.unwrap();

        f.notifier.set_failing(true);
        let loan = f.loans.issue(reservation.id, f.admin).await.unwrap();

        assert!(f.store.find_loan(loan.id).await.unwrap().is_some());
        let stored = f.store.find_copy(copy.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CopyStatus::Loaned);
        assert!(f.notifier.sent().await.is_empty());
        assert_eq!(f.audit.records().await.last().unwrap().action, AuditAction::LoanCreated);
    }

    #[tokio::test]
    async fn test_audit_failure_aborts_issue() {
        let f = fixture().await;
        let user = f.store.add_user(AccountStatus::Active).await;
        let publication = f.store.add_publication("The Invincible", f.clock.now()).await;
        let copy = f.store.add_copy(publication, f.clock.now()).await.unwrap();
        let reservation = f.reservations.create(user, publication).await.unwrap();

        f.audit.set_failing(true);
        let err = f.loans.issue(reservation.id, f.admin).await.unwrap_err();
        assert!(matches!(err, CirculationError::Store(_)));

        assert!(f.loans.list_outstanding_for_user(user).await.unwrap().is_empty());
        let stored = f.store.find_copy(copy.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CopyStatus::Reserved);
        let stored = f.store.find_reservation(reservation.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Active);
        assert!(f.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_return_unknown_loan_is_not_found() {
        let f = fixture().await;
        let err = f.loans.accept_return(LoanId(999), f.admin).await.unwrap_err();
        assert!(matches!(
            err,
            CirculationError::NotFound {
                entity: EntityKind::Loan,
                id: 999
            }
        ));
    }
}
