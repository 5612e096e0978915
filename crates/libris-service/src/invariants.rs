//! Reservation-time invariants, checked inside the mutating transaction.
//!
//! Each violated invariant maps to exactly one [`CirculationError`]
//! variant. The checks read live state under the user row lock, never a
//! cached count.

use tracing::debug;

use libris_core::error::{CirculationError, EntityKind};
use libris_core::result::CirculationResult;
use libris_core::types::UserId;
use libris_database::CirculationTx;
use libris_entity::UserStanding;

use crate::policy::CirculationPolicy;

/// Lock the user and verify they may take one more item.
///
/// Checks, in order: the user exists, their standing is ACTIVE, and their
/// ACTIVE reservations plus outstanding loans are below the limit.
pub async fn ensure_can_reserve(
    tx: &mut dyn CirculationTx,
    user_id: UserId,
    policy: &CirculationPolicy,
) -> CirculationResult<UserStanding> {
    let standing = tx
        .lock_user(user_id)
        .await?
        .ok_or_else(|| CirculationError::not_found(EntityKind::User, user_id.get()))?;

    if !standing.status.can_reserve() {
        debug!(user_id = %user_id, status = %standing.status, "Account not active");
        return Err(CirculationError::AccountNotActive {
            user_id: user_id.get(),
        });
    }

    let active = tx.count_active_items(user_id).await?;
    if active >= policy.max_active_items {
        debug!(
            user_id = %user_id,
            active,
            limit = policy.max_active_items,
            "Active item limit reached"
        );
        return Err(CirculationError::ActiveItemLimitExceeded {
            limit: policy.max_active_items,
        });
    }

    Ok(standing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_database::{CirculationStore, MemoryStore};
    use libris_entity::AccountStatus;

    #[tokio::test]
    async fn test_rejects_inactive_and_banned() {
        let store = MemoryStore::new();
        let policy = CirculationPolicy::default();

        for status in [AccountStatus::Inactive, AccountStatus::Banned] {
            let user = store.add_user(status).await;
            let mut tx = store.begin().await.unwrap();
            let err = ensure_can_reserve(tx.as_mut(), user, &policy)
                .await
                .unwrap_err();
            assert!(matches!(err, CirculationError::AccountNotActive { .. }));
        }
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = ensure_can_reserve(tx.as_mut(), UserId(404), &CirculationPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CirculationError::NotFound {
                entity: EntityKind::User,
                id: 404
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_limit_blocks_everyone() {
        let store = MemoryStore::new();
        let user = store.add_user(AccountStatus::Active).await;
        let policy = CirculationPolicy {
            max_active_items: 0,
            ..CirculationPolicy::default()
        };

        let mut tx = store.begin().await.unwrap();
        let err = ensure_can_reserve(tx.as_mut(), user, &policy)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CirculationError::ActiveItemLimitExceeded { limit: 0 }
        ));
    }
}
