//! Integration tests for reserving and cancelling.

mod helpers;

use libris_core::error::{CirculationError, EntityKind};
use libris_core::types::AuditAction;
use libris_entity::{AccountStatus, CopyStatus, ReservationStatus};

#[tokio::test]
async fn test_single_copy_goes_to_first_reserver() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let first = lib.user().await;
    let second = lib.user().await;

    let reservation = lib.circulation.reserve(first, publication).await.unwrap();
    assert_eq!(reservation.status, ReservationStatus::Active);
    assert_eq!(reservation.copy_id, copies[0].id);
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Reserved);

    let err = lib.circulation.reserve(second, publication).await.unwrap_err();
    assert!(matches!(err, CirculationError::NoCopyAvailable { .. }));
    assert!(err.is_reservation_blocked());
}

#[tokio::test]
async fn test_pickup_deadline_is_three_days_after_reservation() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, _) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;

    let reservation = lib.circulation.reserve(user, publication).await.unwrap();
    assert_eq!(reservation.reserved_at, helpers::day_one());
    assert_eq!(
        reservation.pickup_deadline,
        helpers::day_one() + chrono::Duration::days(3)
    );
}

#[tokio::test]
async fn test_limit_reached_then_cancel_frees_a_slot() {
    let lib = helpers::TestLibrary::new().await;
    let user = lib.user().await;
    let mut held = Vec::new();
    for title in ["Eden", "Fiasco", "Golem XIV"] {
        let (publication, _) = lib.publication(title, 1).await;
        held.push(lib.circulation.reserve(user, publication).await.unwrap());
    }
    let (fourth, copies) = lib.publication("His Master's Voice", 1).await;

    let err = lib.circulation.reserve(user, fourth).await.unwrap_err();
    assert!(matches!(
        err,
        CirculationError::ActiveItemLimitExceeded { limit: 3 }
    ));
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);

    lib.circulation.cancel_by_user(held[0].id, user).await.unwrap();
    let reservation = lib.circulation.reserve(user, fourth).await.unwrap();
    assert_eq!(reservation.copy_id, copies[0].id);
}

#[tokio::test]
async fn test_outstanding_loans_count_toward_limit() {
    let lib = helpers::TestLibrary::new().await;
    let user = lib.user().await;
    for title in ["Eden", "Fiasco"] {
        let (publication, _) = lib.publication(title, 1).await;
        let reservation = lib.circulation.reserve(user, publication).await.unwrap();
        lib.circulation
            .issue_loan(reservation.id, lib.admin)
            .await
            .unwrap();
    }
    let (third, _) = lib.publication("Golem XIV", 1).await;
    lib.circulation.reserve(user, third).await.unwrap();

    let (fourth, _) = lib.publication("Peace on Earth", 1).await;
    let err = lib.circulation.reserve(user, fourth).await.unwrap_err();
    assert!(matches!(err, CirculationError::ActiveItemLimitExceeded { .. }));
}

#[tokio::test]
async fn test_inactive_account_cannot_reserve() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    lib.store
        .set_user_status(user, AccountStatus::Banned)
        .await
        .unwrap();

    let err = lib.circulation.reserve(user, publication).await.unwrap_err();
    assert!(matches!(err, CirculationError::AccountNotActive { .. }));
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);
}

#[tokio::test]
async fn test_user_cannot_cancel_someone_elses_reservation() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, _) = lib.publication("Solaris", 1).await;
    let owner = lib.user().await;
    let stranger = lib.user().await;
    let reservation = lib.circulation.reserve(owner, publication).await.unwrap();

    let err = lib
        .circulation
        .cancel_by_user(reservation.id, stranger)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CirculationError::NotFound {
            entity: EntityKind::Reservation,
            ..
        }
    ));
    assert_eq!(
        lib.reservation_status(&reservation).await,
        ReservationStatus::Active
    );
}

#[tokio::test]
async fn test_admin_cancel_releases_copy_and_is_audited() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    let reservation = lib.circulation.reserve(user, publication).await.unwrap();

    let cancelled = lib
        .circulation
        .cancel_by_admin(reservation.id, lib.admin)
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::CancelledByAdmin);
    assert_eq!(cancelled.cancelled_at, Some(helpers::day_one()));
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);

    let records = lib.audit.records().await;
    let last = records.last().unwrap();
    assert_eq!(last.action, AuditAction::ReservationCancelledByAdmin);
    assert_eq!(last.actor_id, lib.admin);
    assert_eq!(last.target_user_id, Some(user));
    assert_eq!(last.copy_id, Some(copies[0].id));
}

#[tokio::test]
async fn test_cancelled_reservation_cannot_be_cancelled_again() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, _) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    let reservation = lib.circulation.reserve(user, publication).await.unwrap();
    lib.circulation
        .cancel_by_user(reservation.id, user)
        .await
        .unwrap();

    let err = lib
        .circulation
        .cancel_by_admin(reservation.id, lib.admin)
        .await
        .unwrap_err();
    assert!(matches!(err, CirculationError::InvalidState { .. }));
    assert_eq!(
        lib.reservation_status(&reservation).await,
        ReservationStatus::CancelledByUser
    );
}

#[tokio::test]
async fn test_lowest_id_copy_is_allocated_first() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 3).await;
    let first = lib.user().await;
    let second = lib.user().await;

    let a = lib.circulation.reserve(first, publication).await.unwrap();
    let b = lib.circulation.reserve(second, publication).await.unwrap();
    assert_eq!(a.copy_id, copies[0].id);
    assert_eq!(b.copy_id, copies[1].id);
    assert!(lib.circulation.can_reserve(publication).await.unwrap());
}

#[tokio::test]
async fn test_audit_write_failure_rolls_back_reservation() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;

    lib.audit.set_failing(true);
    let err = lib.circulation.reserve(user, publication).await.unwrap_err();
    assert!(matches!(err, CirculationError::Store(_)));
    assert!(!err.is_reservation_blocked());

    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);
    assert!(lib.circulation.user_reservations(user).await.unwrap().is_empty());
    assert!(lib.circulation.can_reserve(publication).await.unwrap());

    lib.audit.set_failing(false);
    assert!(lib.audit.records().await.is_empty());
}
