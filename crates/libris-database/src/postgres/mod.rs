//! PostgreSQL entity store.
//!
//! Each transaction sets a local `lock_timeout`, so a blocked row lock
//! fails fast with SQLSTATE `55P03`, which is reported as
//! [`ErrorKind::Contention`]. Copy allocation uses `FOR UPDATE SKIP LOCKED`.

mod tx;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use libris_core::error::{AppError, ErrorKind};
use libris_core::result::AppResult;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_entity::{Copy, Loan, LoanDetails, Reservation};

use crate::store::{CirculationStore, CirculationTx};

pub use tx::PgCirculationTx;

/// `lock_not_available`
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `serialization_failure`
const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";
/// `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error to an [`AppError`], classifying lock failures as contention.
pub(crate) fn db_error(message: &str, err: sqlx::Error) -> AppError {
    let kind = match &err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => {
                ErrorKind::Contention
            }
            Some(UNIQUE_VIOLATION) => ErrorKind::Conflict,
            _ => ErrorKind::Database,
        },
        sqlx::Error::PoolTimedOut => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Database,
    };
    AppError::with_source(kind, message, err)
}

/// Entity store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCirculationStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgCirculationStore {
    /// Create a store over `pool` whose row locks give up after `lock_timeout`.
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }
}

#[async_trait]
impl CirculationStore for PgCirculationStore {
    async fn begin(&self) -> AppResult<Box<dyn CirculationTx>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        let timeout = format!("{}ms", self.lock_timeout.as_millis());
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(&timeout)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to set lock timeout", e))?;

        debug!(lock_timeout = %timeout, "Transaction started");
        Ok(Box::new(PgCirculationTx::new(tx)))
    }

    async fn find_copy(&self, id: CopyId) -> AppResult<Option<Copy>> {
        sqlx::query_as::<_, Copy>("SELECT * FROM copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find copy", e))
    }

    async fn find_reservation(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find reservation", e))
    }

    async fn find_loan(&self, id: LoanId) -> AppResult<Option<Loan>> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find loan", e))
    }

    async fn active_reservations(
        &self,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to count active reservations", e))?;

        let items = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status = 'active' \
             ORDER BY reserved_at DESC, id DESC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list active reservations", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn active_reservations_for_user(&self, user_id: UserId) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 AND status = 'active' \
             ORDER BY reserved_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list user reservations", e))
    }

    async fn outstanding_loans(&self, page: &PageRequest) -> AppResult<PageResponse<Loan>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE returned_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count outstanding loans", e))?;

        let items = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE returned_at IS NULL \
             ORDER BY due_at ASC, id ASC LIMIT $1 OFFSET $2",
        )
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list outstanding loans", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn outstanding_loans_for_user(&self, user_id: UserId) -> AppResult<Vec<Loan>> {
        sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE user_id = $1 AND returned_at IS NULL \
             ORDER BY loaned_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list user loans", e))
    }

    async fn outstanding_loans_due_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<LoanDetails>> {
        sqlx::query_as::<_, LoanDetails>(
            "SELECT l.*, p.title, c.inventory_code \
             FROM loans l \
             JOIN copies c ON c.id = l.copy_id \
             JOIN publications p ON p.id = c.publication_id \
             WHERE l.returned_at IS NULL AND l.due_at >= $1 AND l.due_at < $2 \
             ORDER BY l.due_at ASC, l.id ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list loans due in window", e))
    }

    async fn has_available_copy(&self, publication_id: PublicationId) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM copies WHERE publication_id = $1 \
             AND status = 'available' AND deleted_at IS NULL)",
        )
        .bind(publication_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check copy availability", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Database health check failed", e))
    }
}
