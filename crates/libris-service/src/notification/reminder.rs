//! Daily DUE_SOON and OVERDUE reminders for outstanding loans.
//!
//! Days are calendar days in UTC. A loan gets DUE_SOON on the day that is
//! exactly `due_soon_days` before its due date and OVERDUE on the day that
//! is exactly `overdue_after_days` after it, so running the job once a day
//! sends each message once.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use libris_core::clock::Clock;
use libris_core::result::CirculationResult;
use libris_database::CirculationStore;

use super::rules::NotificationRules;
use crate::events::CirculationEvents;
use crate::policy::CirculationPolicy;

/// Outcome of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSummary {
    /// Loans that received a DUE_SOON reminder.
    pub due_soon: usize,
    /// Loans that received an OVERDUE notice.
    pub overdue: usize,
    /// Deliveries the notifier rejected.
    pub failed: usize,
}

/// Sends loan reminders.
#[derive(Debug, Clone)]
pub struct LoanReminderService {
    store: Arc<dyn CirculationStore>,
    clock: Arc<dyn Clock>,
    policy: CirculationPolicy,
    events: CirculationEvents,
}

/// `[start of day, start of next day)` for the day `offset_days` from `now`.
fn day_window(now: DateTime<Utc>, offset_days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    let start = midnight + Duration::days(offset_days);
    (start, start + Duration::days(1))
}

impl LoanReminderService {
    /// Creates a new reminder service.
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

    /// Send today's reminders.
    pub async fn run(&self) -> CirculationResult<ReminderSummary> {
        let now = self.clock.now();
        let mut summary = ReminderSummary::default();

        let (from, to) = day_window(now, i64::from(self.policy.due_soon_days));
        for details in self.store.outstanding_loans_due_between(from, to).await? {
            summary.due_soon += 1;
            let notification = NotificationRules::due_soon(&details, self.policy.due_soon_days);
            if !self.events.notify(notification).await {
                summary.failed += 1;
            }
        }

        // With overdue_after_days = 0 the window reaches past `now`.
        let (from, to) = day_window(now, -i64::from(self.policy.overdue_after_days));
        let overdue = self.store.outstanding_loans_due_between(from, to).await?;
        for details in overdue.into_iter().filter(|d| d.loan.is_overdue(now)) {
            summary.overdue += 1;
            if !self.events.notify(NotificationRules::overdue(&details)).await {
                summary.failed += 1;
            }
        }

        info!(
            due_soon = summary.due_soon,
            overdue = summary.overdue,
            failed = summary.failed,
            "Loan reminders sent"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use libris_core::clock::ManualClock;
    use libris_database::{MemoryNotifier, MemoryStore};
    use libris_entity::AccountStatus;

    use crate::loan::LoanService;
    use crate::reservation::ReservationService;

    #[tokio::test]
    async fn test_same_day_overdue_waits_for_due_instant() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap());
        let notifier = MemoryNotifier::new();
        let policy = CirculationPolicy {
            overdue_after_days: 0,
            ..CirculationPolicy::default()
        };
        let events = CirculationEvents::new(Arc::new(notifier.clone()));
        let reservations =
            ReservationService::new(Arc::new(store.clone()), Arc::new(clock.clone()), policy);
        let loans = LoanService::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            policy,
            events.clone(),
        );
        let reminders = LoanReminderService::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            policy,
            events,
        );

        let admin = store.add_user(AccountStatus::Active).await;
        let user = store.add_user(AccountStatus::Active).await;
        let publication = store.add_publication("Peace on Earth", clock.now()).await;
        store.add_copy(publication, clock.now()).await.unwrap();
        let reservation = reservations.create(user, publication).await.unwrap();
        // Due 2025-07-01 10:00.
        loans.issue(reservation.id, admin).await.unwrap();

        clock.set(Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap());
        assert_eq!(reminders.run().await.unwrap().overdue, 0);

        clock.set(Utc.with_ymd_and_hms(2025, 7, 1, 11, 0, 0).unwrap());
        assert_eq!(reminders.run().await.unwrap().overdue, 1);
    }

    #[test]
    fn test_day_window() {
        let now = Utc.with_ymd_and_hms(2025, 5, 10, 8, 0, 0).unwrap();
        let (from, to) = day_window(now, 3);
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 5, 13, 0, 0, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 5, 14, 0, 0, 0).unwrap());

        let (from, _) = day_window(now, -1);
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 5, 9, 0, 0, 0).unwrap());
    }
}
