//! Integration tests for the expiry sweep and the scheduled jobs.

mod helpers;

use chrono::{Duration, TimeZone, Utc};

use libris_core::types::MessageKind;
use libris_entity::{CopyStatus, ReservationStatus};
use libris_worker::{ExpirySweepJob, LoanReminderJob};

#[tokio::test]
async fn test_sweep_expires_only_overdue_reservations() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 2).await;
    let early = lib.user().await;
    let late = lib.user().await;

    let stale = lib.circulation.reserve(early, publication).await.unwrap();
    lib.clock.advance(Duration::days(2));
    let fresh = lib.circulation.reserve(late, publication).await.unwrap();
    lib.clock.advance(Duration::days(2));

    let job = ExpirySweepJob::new(lib.circulation.clone());
    assert_eq!(job.run().await, 1);

    let stale = lib.reservation(&stale).await;
    assert_eq!(stale.status, ReservationStatus::Expired);
    assert_eq!(stale.expired_at, Some(helpers::day_one() + Duration::days(4)));
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);

    assert_eq!(
        lib.reservation_status(&fresh).await,
        ReservationStatus::Active
    );
    assert_eq!(lib.copy_status(&copies[1]).await, CopyStatus::Reserved);

    assert_eq!(job.run().await, 0);
}

#[tokio::test]
async fn test_sweep_keeps_reservation_at_deadline() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, _) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    let reservation = lib.circulation.reserve(user, publication).await.unwrap();

    lib.clock.set(reservation.pickup_deadline);
    assert_eq!(lib.circulation.sweep_expired().await, 0);
    assert_eq!(
        lib.reservation_status(&reservation).await,
        ReservationStatus::Active
    );
}

#[tokio::test]
async fn test_reminders_are_sent_for_due_soon_and_overdue_loans() {
    let lib = helpers::TestLibrary::new().await;
    let user = lib.user().await;

    let (first, _) = lib.publication("Eden", 1).await;
    let reservation = lib.circulation.reserve(user, first).await.unwrap();
    lib.circulation
        .issue_loan(reservation.id, lib.admin)
        .await
        .unwrap();

    lib.clock.advance(Duration::days(4));
    let (second, _) = lib.publication("Fiasco", 1).await;
    let reservation = lib.circulation.reserve(user, second).await.unwrap();
    lib.circulation
        .issue_loan(reservation.id, lib.admin)
        .await
        .unwrap();

    // Day one loan is due 2025-03-31, the second one 2025-04-04.
    lib.clock
        .set(Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap());
    let summary = LoanReminderJob::new(lib.circulation.clone())
        .run()
        .await
        .unwrap();
    assert_eq!(summary.due_soon, 1);
    assert_eq!(summary.overdue, 1);
    assert_eq!(summary.failed, 0);

    let kinds: Vec<_> = lib.notifier.sent().await.into_iter().map(|m| m.kind).collect();
    assert!(kinds.contains(&MessageKind::DueSoon));
    assert!(kinds.contains(&MessageKind::Overdue));
}
