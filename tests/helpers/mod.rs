//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use libris_core::clock::{Clock, ManualClock};
use libris_core::types::{PublicationId, UserId};
use libris_database::{CirculationStore, MemoryAuditLog, MemoryNotifier, MemoryStore};
use libris_entity::{AccountStatus, Copy, CopyStatus, Reservation, ReservationStatus};
use libris_service::{CirculationPolicy, CirculationService};

/// The whole engine running on the in-memory store and a frozen clock.
pub struct TestLibrary {
    /// Entity store, also used to seed users and the catalog
    pub store: MemoryStore,
    /// Clock shared by every service
    pub clock: ManualClock,
    /// Records every notification sent
    pub notifier: MemoryNotifier,
    /// Audit entries committed through the store
    pub audit: MemoryAuditLog,
    /// The engine under test
    pub circulation: Arc<CirculationService>,
    /// Staff account used as the actor of admin operations
    pub admin: UserId,
}

/// Day 1 of every scenario, 10:00 UTC.
pub fn day_one() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
}

impl TestLibrary {
    /// Create a new library with the default circulation rules
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        let clock = ManualClock::new(day_one());
        let notifier = MemoryNotifier::new();
        let audit = store.audit_log();

        let circulation = Arc::new(CirculationService::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            CirculationPolicy::default(),
            Arc::new(notifier.clone()),
        ));
        let admin = store.add_user(AccountStatus::Active).await;

        Self {
            store,
            clock,
            notifier,
            audit,
            circulation,
            admin,
        }
    }

    /// Register an ACTIVE user
    pub async fn user(&self) -> UserId {
        self.store.add_user(AccountStatus::Active).await
    }

    /// Add a publication with `copies` AVAILABLE copies
    pub async fn publication(&self, title: &str, copies: usize) -> (PublicationId, Vec<Copy>) {
        let publication = self.store.add_publication(title, self.clock.now()).await;
        let mut added = Vec::with_capacity(copies);
        for _ in 0..copies {
            added.push(
                self.store
                    .add_copy(publication, self.clock.now())
                    .await
                    .expect("Failed to add copy"),
            );
        }
        (publication, added)
    }

    /// Current status of a copy
    pub async fn copy_status(&self, copy: &Copy) -> CopyStatus {
        self.store
            .find_copy(copy.id)
            .await
            .expect("Failed to read copy")
            .expect("Copy should exist")
            .status
    }

    /// Current state of a reservation
    pub async fn reservation(&self, reservation: &Reservation) -> Reservation {
        self.store
            .find_reservation(reservation.id)
            .await
            .expect("Failed to read reservation")
            .expect("Reservation should exist")
    }

    /// Current status of a reservation
    pub async fn reservation_status(&self, reservation: &Reservation) -> ReservationStatus {
        self.reservation(reservation).await.status
    }
}

