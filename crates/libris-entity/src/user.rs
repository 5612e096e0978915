//! User standing as seen by the circulation engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use libris_core::types::UserId;

/// Account standing, owned by user administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Registered but not yet activated.
    Inactive,
    /// In good standing.
    Active,
    /// Blocked by staff.
    Banned,
}

impl AccountStatus {
    /// Whether the account may create reservations.
    pub fn can_reserve(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "INACTIVE",
            Self::Active => "ACTIVE",
            Self::Banned => "BANNED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of a user record the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserStanding {
    /// The user.
    #[sqlx(rename = "id")]
    pub user_id: UserId,
    /// Current account standing.
    pub status: AccountStatus,
}
