//! User-facing message kinds emitted by the circulation engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The reason a user is being told something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "message_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// A loan was issued.
    LoanCreated,
    /// A loan is due in a few days.
    DueSoon,
    /// A loan is past its due date.
    Overdue,
    /// The account was banned.
    AccountBanned,
    /// The account was unbanned.
    AccountUnbanned,
}

impl MessageKind {
    /// Return the kind as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoanCreated => "LOAN_CREATED",
            Self::DueSoon => "DUE_SOON",
            Self::Overdue => "OVERDUE",
            Self::AccountBanned => "ACCOUNT_BANNED",
            Self::AccountUnbanned => "ACCOUNT_UNBANNED",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message the core has decided a user must receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient.
    pub user_id: UserId,
    /// Why the user is being told.
    pub kind: MessageKind,
    /// Short title.
    pub title: String,
    /// Full message body.
    pub body: String,
}
