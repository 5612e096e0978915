//! Integration tests for concurrent circulation calls.

mod helpers;

use std::collections::HashSet;

use chrono::Duration;
use futures::future::join_all;

use libris_core::error::CirculationError;
use libris_core::types::pagination::PageRequest;
use libris_entity::{CopyStatus, ReservationStatus};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_allocation() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 3).await;
    let mut users = Vec::new();
    for _ in 0..10 {
        users.push(lib.user().await);
    }

    let tasks = users.into_iter().map(|user| {
        let circulation = lib.circulation.clone();
        tokio::spawn(async move { circulation.reserve(user, publication).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let granted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(granted.len(), 3);
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, CirculationError::NoCopyAvailable { .. }));
        }
    }

    let claimed: HashSet<_> = granted.iter().map(|r| r.copy_id).collect();
    assert_eq!(claimed.len(), 3);
    for copy in &copies {
        assert_eq!(lib.copy_status(copy).await, CopyStatus::Reserved);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserves_respect_item_limit() {
    let lib = helpers::TestLibrary::new().await;
    let user = lib.user().await;
    let mut publications = Vec::new();
    for i in 0..8 {
        let (publication, _) = lib.publication(&format!("Volume {i}"), 1).await;
        publications.push(publication);
    }

    let tasks = publications.into_iter().map(|publication| {
        let circulation = lib.circulation.clone();
        tokio::spawn(async move { circulation.reserve(user, publication).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 3);
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, CirculationError::ActiveItemLimitExceeded { .. }));
        }
    }
    assert_eq!(
        lib.circulation.user_reservations(user).await.unwrap().len(),
        3
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_racing_admin_cancel_has_one_winner() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    let reservation = lib.circulation.reserve(user, publication).await.unwrap();
    lib.clock.advance(Duration::days(4));

    let sweep = {
        let circulation = lib.circulation.clone();
        tokio::spawn(async move { circulation.sweep_expired().await })
    };
    let cancel = {
        let circulation = lib.circulation.clone();
        let admin = lib.admin;
        tokio::spawn(async move { circulation.cancel_by_admin(reservation.id, admin).await })
    };
    let swept = sweep.await.expect("task panicked");
    let cancelled = cancel.await.expect("task panicked");

    let status = lib.reservation_status(&reservation).await;
    match cancelled {
        Ok(_) => {
            assert_eq!(swept, 0);
            assert_eq!(status, ReservationStatus::CancelledByAdmin);
        }
        Err(e) => {
            assert!(matches!(e, CirculationError::InvalidState { .. }));
            assert_eq!(swept, 1);
            assert_eq!(status, ReservationStatus::Expired);
        }
    }
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);
    let active = lib
        .circulation
        .active_reservations(&PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_eq!(active.total_items, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_racing_loan_issue_never_lends_an_expired_reservation() {
    let lib = helpers::TestLibrary::new().await;
    let (publication, copies) = lib.publication("Solaris", 1).await;
    let user = lib.user().await;
    let reservation = lib.circulation.reserve(user, publication).await.unwrap();
    lib.clock.advance(Duration::days(4));

    let sweep = {
        let circulation = lib.circulation.clone();
        tokio::spawn(async move { circulation.sweep_expired().await })
    };
    let issue = {
        let circulation = lib.circulation.clone();
        let admin = lib.admin;
        tokio::spawn(async move { circulation.issue_loan(reservation.id, admin).await })
    };
    let swept = sweep.await.expect("task panicked");
    let issued = issue.await.expect("task panicked");

    match issued {
        Err(CirculationError::ReservationExpired { reservation_id }) => {
            assert_eq!(reservation_id, reservation.id.get());
            assert_eq!(swept, 0);
        }
        Err(CirculationError::InvalidState { .. }) => assert_eq!(swept, 1),
        other => panic!("unexpected issue outcome: {other:?}"),
    }
    assert_eq!(
        lib.reservation_status(&reservation).await,
        ReservationStatus::Expired
    );
    assert!(lib.circulation.user_loans(user).await.unwrap().is_empty());
    assert_eq!(lib.copy_status(&copies[0]).await, CopyStatus::Available);
}
