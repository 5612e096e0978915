//! Read access to the audit log. Records are written inside circulation
//! transactions by `PgCirculationTx::record_audit`.

use sqlx::PgPool;

use libris_core::error::{AppError, ErrorKind};
use libris_core::result::AppResult;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::UserId;
use libris_entity::AuditEntry;

/// Repository for audit log entries.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search the audit log, newest first, optionally by actor.
    pub async fn search(
        &self,
        actor_id: Option<UserId>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditEntry>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM audit_log WHERE ($1::BIGINT IS NULL OR actor_id = $1)",
        )
        .bind(actor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count audit entries", e)
        })?;

        let entries = sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_log WHERE ($1::BIGINT IS NULL OR actor_id = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(actor_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search audit log", e))?;

        Ok(PageResponse::new(entries, page, total as u64))
    }
}
