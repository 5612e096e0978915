//! In-memory entity store using a Tokio mutex for single-node deployments.
//!
//! A transaction holds the one table lock from `begin` until it is
//! committed or dropped, so transactions run strictly one after another.
//! Changes are made on a working copy of the tables and swapped in on
//! commit; dropping the transaction discards them. A transaction that
//! cannot take the lock within the configured timeout fails with
//! `Contention`.
//!
//! Suitable for single-node deployments and tests only.

mod sinks;
mod tx;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use libris_core::error::AppError;
use libris_core::result::AppResult;
use libris_core::types::audit::AuditRecord;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_entity::copy::inventory_code;
use libris_entity::{
    AccountStatus, Copy, CopyStatus, Loan, LoanDetails, Publication, Reservation,
    ReservationStatus, UserStanding,
};

use crate::store::{CirculationStore, CirculationTx};

pub use sinks::{MemoryAuditLog, MemoryNotifier};
pub use tx::MemoryTx;

/// Default time a transaction waits for the table lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// All rows, keyed by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<UserId, UserStanding>,
    pub(crate) publications: BTreeMap<PublicationId, Publication>,
    pub(crate) copies: BTreeMap<CopyId, Copy>,
    pub(crate) reservations: BTreeMap<ReservationId, Reservation>,
    pub(crate) loans: BTreeMap<LoanId, Loan>,
    pub(crate) audit: Vec<AuditRecord>,
    last_id: i64,
}

impl Tables {
    /// Next value of the shared id sequence.
    pub(crate) fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    pub(crate) fn active_item_count(&self, user_id: UserId) -> usize {
        let reservations = self
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && r.status == ReservationStatus::Active)
            .count();
        let loans = self
            .loans
            .values()
            .filter(|l| l.user_id == user_id && l.is_outstanding())
            .count();
        reservations + loans
    }

    fn new_copy(&mut self, publication_id: PublicationId, added_at: DateTime<Utc>) -> Copy {
        let id = CopyId(self.next_id());
        let copy = Copy {
            id,
            publication_id,
            inventory_code: inventory_code(added_at, id),
            status: CopyStatus::Available,
            created_at: added_at,
            updated_at: added_at,
            deleted_at: None,
        };
        self.copies.insert(id, copy.clone());
        copy
    }
}

/// Entity store kept entirely in process memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    audit_failing: Arc<AtomicBool>,
    lock_timeout: Duration,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an empty store whose transactions wait at most `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            audit_failing: Arc::new(AtomicBool::new(false)),
            lock_timeout,
        }
    }

    /// Handle on the audit records committed through this store.
    pub fn audit_log(&self) -> MemoryAuditLog {
        MemoryAuditLog::new(self.tables.clone(), self.audit_failing.clone())
    }

    /// Register a user with the given standing.
    pub async fn add_user(&self, status: AccountStatus) -> UserId {
        let mut tables = self.tables.lock().await;
        let user_id = UserId(tables.next_id());
        tables
            .users
            .insert(user_id, UserStanding { user_id, status });
        user_id
    }

    /// Change a user's standing, as user administration would.
    pub async fn set_user_status(&self, user_id: UserId, status: AccountStatus) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.status = status;
        Ok(())
    }

    /// Add a publication to the catalog.
    pub async fn add_publication(
        &self,
        title: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> PublicationId {
        let mut tables = self.tables.lock().await;
        let id = PublicationId(tables.next_id());
        tables.publications.insert(
            id,
            Publication {
                id,
                title: title.into(),
                created_at,
            },
        );
        id
    }

    /// Add an AVAILABLE copy of a publication outside any circulation flow.
    pub async fn add_copy(
        &self,
        publication_id: PublicationId,
        added_at: DateTime<Utc>,
    ) -> AppResult<Copy> {
        let mut tables = self.tables.lock().await;
        if !tables.publications.contains_key(&publication_id) {
            return Err(AppError::not_found(format!(
                "Publication {publication_id} not found"
            )));
        }
        Ok(tables.new_copy(publication_id, added_at))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn paginate<T: Clone>(rows: Vec<T>, page: &PageRequest) -> PageResponse<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    PageResponse::new(items, page, total)
}

fn active_sorted<'a>(rows: impl Iterator<Item = &'a Reservation>) -> Vec<Reservation> {
    let mut out: Vec<Reservation> = rows
        .filter(|r| r.status == ReservationStatus::Active)
        .cloned()
        .collect();
    out.sort_by(|a, b| b.reserved_at.cmp(&a.reserved_at).then(b.id.cmp(&a.id)));
    out
}

#[async_trait]
impl CirculationStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn CirculationTx>> {
        let guard = tokio::time::timeout(self.lock_timeout, self.tables.clone().lock_owned())
            .await
            .map_err(|_| AppError::contention("Timed out waiting for the in-memory store lock"))?;
        debug!("In-memory transaction started");
        Ok(Box::new(MemoryTx::new(guard, self.audit_failing.clone())))
    }

    async fn find_copy(&self, id: CopyId) -> AppResult<Option<Copy>> {
        Ok(self.tables.lock().await.copies.get(&id).cloned())
    }

    async fn find_reservation(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.tables.lock().await.reservations.get(&id).cloned())
    }

    async fn find_loan(&self, id: LoanId) -> AppResult<Option<Loan>> {
        Ok(self.tables.lock().await.loans.get(&id).cloned())
    }

    async fn active_reservations(
        &self,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(paginate(active_sorted(tables.reservations.values()), page))
    }

    async fn active_reservations_for_user(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(active_sorted(
            tables.reservations.values().filter(|r| r.user_id == user_id),
        ))
    }

    async fn outstanding_loans(&self, page: &PageRequest) -> AppResult<PageResponse<Loan>> {
        let tables = self.tables.lock().await;
        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|l| l.is_outstanding())
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.due_at.cmp(&b.due_at).then(a.id.cmp(&b.id)));
        Ok(paginate(loans, page))
    }

    async fn outstanding_loans_for_user(&self, user_id: UserId) -> AppResult<Vec<Loan>> {
        let tables = self.tables.lock().await;
        let mut loans: Vec<Loan> = tables
            .loans
            .values()
            .filter(|l| l.user_id == user_id && l.is_outstanding())
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.loaned_at.cmp(&a.loaned_at).then(b.id.cmp(&a.id)));
        Ok(loans)
    }

    async fn outstanding_loans_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<LoanDetails>> {
        let tables = self.tables.lock().await;
        let mut due: Vec<LoanDetails> = tables
            .loans
            .values()
            .filter(|l| l.is_outstanding() && l.due_at >= from && l.due_at < to)
            .filter_map(|loan| {
                let copy = tables.copies.get(&loan.copy_id)?;
                let publication = tables.publications.get(&copy.publication_id)?;
                Some(LoanDetails {
                    loan: loan.clone(),
                    title: publication.title.clone(),
                    inventory_code: copy.inventory_code.clone(),
                })
            })
            .collect();
        due.sort_by(|a, b| a.loan.due_at.cmp(&b.loan.due_at).then(a.loan.id.cmp(&b.loan.id)));
        Ok(due)
    }

    async fn has_available_copy(&self, publication_id: PublicationId) -> AppResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .copies
            .values()
            .any(|c| c.publication_id == publication_id && c.is_allocatable()))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
