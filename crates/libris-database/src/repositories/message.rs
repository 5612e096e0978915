//! User message repository; the production notifier.

use async_trait::async_trait;
use sqlx::PgPool;

use libris_core::error::{AppError, ErrorKind};
use libris_core::result::AppResult;
use libris_core::traits::Notifier;
use libris_core::types::pagination::{PageRequest, PageResponse};
use libris_core::types::{Notification, UserId};
use libris_entity::Message;

/// Repository for the `messages` table; stores each notification in the
/// recipient's inbox.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one message.
    pub async fn create(&self, notification: &Notification) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (user_id, kind, title, body) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(notification.user_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create message", e))
    }

    /// List a user's messages, newest first.
    pub async fn find_by_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count messages", e)
            })?;

        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list messages", e))?;

        Ok(PageResponse::new(messages, page, total as u64))
    }
}

#[async_trait]
impl Notifier for MessageRepository {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        self.create(&notification).await.map(|_| ())
    }
}
