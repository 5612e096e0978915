//! One PostgreSQL transaction implementing [`CirculationTx`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use libris_core::result::AppResult;
use libris_core::types::audit::AuditRecord;
use libris_core::types::{CopyId, LoanId, PublicationId, ReservationId, UserId};
use libris_entity::copy::inventory_code;
use libris_entity::{
    Copy, CopyStatus, Loan, NewCopy, NewLoan, NewReservation, Reservation, UserStanding,
};

use super::db_error;
use crate::store::CirculationTx;

/// An open transaction. Dropped without [`CirculationTx::commit`], sqlx
/// rolls it back.
pub struct PgCirculationTx {
    tx: Transaction<'static, Postgres>,
}

impl PgCirculationTx {
    pub(super) fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl CirculationTx for PgCirculationTx {
    async fn lock_user(&mut self, user_id: UserId) -> AppResult<Option<UserStanding>> {
        sqlx::query_as::<_, UserStanding>("SELECT id, status FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock user", e))
    }

    async fn count_active_items(&mut self, user_id: UserId) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT \
               (SELECT COUNT(*) FROM reservations WHERE user_id = $1 AND status = 'active') \
             + (SELECT COUNT(*) FROM loans WHERE user_id = $1 AND returned_at IS NULL)",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to count active items", e))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn lock_available_copy(
        &mut self,
        publication_id: PublicationId,
    ) -> AppResult<Option<Copy>> {
        sqlx::query_as::<_, Copy>(
            "SELECT * FROM copies \
             WHERE publication_id = $1 AND status = 'available' AND deleted_at IS NULL \
             ORDER BY id ASC LIMIT 1 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(publication_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to claim available copy", e))
    }

    async fn lock_copy(&mut self, copy_id: CopyId) -> AppResult<Option<Copy>> {
        sqlx::query_as::<_, Copy>("SELECT * FROM copies WHERE id = $1 FOR UPDATE")
            .bind(copy_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock copy", e))
    }

    async fn set_copy_status(
        &mut self,
        copy_id: CopyId,
        from: CopyStatus,
        to: CopyStatus,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE copies SET status = $3, updated_at = $4 \
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL",
        )
        .bind(copy_id)
        .bind(from)
        .bind(to)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update copy status", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn soft_delete_copy(&mut self, copy_id: CopyId, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE copies SET status = 'unavailable', deleted_at = $2, updated_at = $2 \
             WHERE id = $1 AND status = 'available' AND deleted_at IS NULL",
        )
        .bind(copy_id)
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to withdraw copy", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_copy(&mut self, data: &NewCopy) -> AppResult<Copy> {
        let id: i64 = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('copies', 'id'))")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to allocate copy id", e))?;
        let id = CopyId(id);

        sqlx::query_as::<_, Copy>(
            "INSERT INTO copies (id, publication_id, inventory_code, status, created_at, updated_at) \
             VALUES ($1, $2, $3, 'available', $4, $4) RETURNING *",
        )
        .bind(id)
        .bind(data.publication_id)
        .bind(inventory_code(data.created_at, id))
        .bind(data.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert copy", e))
    }

    async fn publication_title(
        &mut self,
        publication_id: PublicationId,
    ) -> AppResult<Option<String>> {
        sqlx::query_scalar("SELECT title FROM publications WHERE id = $1")
            .bind(publication_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to read publication title", e))
    }

    async fn insert_reservation(&mut self, data: &NewReservation) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "INSERT INTO reservations (user_id, copy_id, reserved_at, pickup_deadline, status) \
             VALUES ($1, $2, $3, $4, 'active') RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.copy_id)
        .bind(data.reserved_at)
        .bind(data.pickup_deadline)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert reservation", e))
    }

    async fn lock_reservation(&mut self, id: ReservationId) -> AppResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock reservation", e))
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE reservations \
             SET status = $2, cancelled_at = $3, expired_at = $4, fulfilled_at = $5 \
             WHERE id = $1 AND status = 'active'",
        )
        .bind(reservation.id)
        .bind(reservation.status)
        .bind(reservation.cancelled_at)
        .bind(reservation.expired_at)
        .bind(reservation.fulfilled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to update reservation", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn expire_overdue_reservations(
        &mut self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Reservation>> {
        // Data-modifying CTEs always run to completion, so `released`
        // executes even though the outer query only reads `expired`.
        sqlx::query_as::<_, Reservation>(
            "WITH expired AS ( \
                 UPDATE reservations \
                 SET status = 'expired', expired_at = COALESCE(expired_at, $1) \
                 WHERE id IN ( \
                     SELECT id FROM reservations \
                     WHERE status = 'active' AND pickup_deadline < $1 \
                     FOR UPDATE SKIP LOCKED \
                 ) \
                 RETURNING * \
             ), released AS ( \
                 UPDATE copies c SET status = 'available', updated_at = $1 \
                 FROM expired e \
                 WHERE c.id = e.copy_id AND c.status = 'reserved' \
                 RETURNING c.id \
             ) \
             SELECT * FROM expired ORDER BY id",
        )
        .bind(now)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to expire overdue reservations", e))
    }

    async fn insert_loan(&mut self, data: &NewLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            "INSERT INTO loans (reservation_id, copy_id, user_id, loaned_at, due_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.reservation_id)
        .bind(data.copy_id)
        .bind(data.user_id)
        .bind(data.loaned_at)
        .bind(data.due_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to insert loan", e))
    }

    async fn lock_loan(&mut self, id: LoanId) -> AppResult<Option<Loan>> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock loan", e))
    }

    async fn mark_loan_returned(&mut self, id: LoanId, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE loans SET returned_at = $2 WHERE id = $1 AND returned_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to mark loan returned", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_audit(&mut self, record: &AuditRecord) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO audit_log (actor_id, target_user_id, action, copy_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.actor_id)
        .bind(record.target_user_id)
        .bind(record.action.as_str())
        .bind(record.copy_id)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to write audit record", e))?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }
}
