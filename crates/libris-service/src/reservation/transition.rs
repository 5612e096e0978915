//! Applying a reservation transition together with its copy transition.

use chrono::{DateTime, Utc};

use libris_core::error::{CirculationError, EntityKind};
use libris_core::result::CirculationResult;
use libris_database::CirculationTx;
use libris_entity::{CopyStatus, Reservation, ReservationTransition};

/// Move a locked reservation out of ACTIVE and its copy out of RESERVED,
/// inside `tx`.
///
/// Fulfillment sends the copy to LOANED; every other transition returns it
/// to AVAILABLE. Fails with `InvalidState` when the reservation is already
/// terminal or when either guarded write finds the row changed.
pub async fn apply_transition(
    tx: &mut dyn CirculationTx,
    reservation: &mut Reservation,
    transition: ReservationTransition,
    now: DateTime<Utc>,
) -> CirculationResult<()> {
    let id = reservation.id.get();
    reservation
        .apply(transition, now)
        .map_err(|status| CirculationError::invalid_state(EntityKind::Reservation, id, status))?;

    if !tx.update_reservation(reservation).await? {
        return Err(CirculationError::invalid_state(
            EntityKind::Reservation,
            id,
            "no longer ACTIVE",
        ));
    }

    let copy_target = match transition {
        ReservationTransition::Fulfill => CopyStatus::Loaned,
        ReservationTransition::CancelByUser
        | ReservationTransition::CancelByAdmin
        | ReservationTransition::Expire => CopyStatus::Available,
    };
    let copy_id = reservation.copy_id;
    if !tx
        .set_copy_status(copy_id, CopyStatus::Reserved, copy_target, now)
        .await?
    {
        let status = match tx.lock_copy(copy_id).await? {
            Some(copy) => copy.status.to_string(),
            None => "missing".to_string(),
        };
        return Err(CirculationError::invalid_state(
            EntityKind::Copy,
            copy_id.get(),
            status,
        ));
    }

    Ok(())
}
