//! Stored user message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::{MessageId, MessageKind, UserId};

/// A message persisted for a user's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique message identifier.
    pub id: MessageId,
    /// Recipient.
    pub user_id: UserId,
    /// Message kind.
    pub kind: MessageKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub body: String,
    /// When the message was stored.
    pub created_at: DateTime<Utc>,
}
