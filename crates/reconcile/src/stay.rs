//! Reconciliation of a single stay.

use hotelier_core::bill::reconcile_bill;
use hotelier_core::billing::{compute_charges, ChargeBreakdown, HotelPolicy};
use hotelier_core::types::{Money, Timestamp};
use hotelier_db::models::stay::Stay;
use hotelier_tenancy::TenantStore;

use crate::error::StayError;

/// Result of reconciling one stay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayOutcome {
    pub charges: ChargeBreakdown,
    /// Bill total after reconciliation.
    pub total: Money,
    /// Whether the bill was written.
    pub written: bool,
}

/// Recompute the system charges of `stay` at `now` and write them to its
/// open bill.
///
/// Manual items are left alone. The bill is only written when its system
/// charges or its total differ from the freshly computed ones, so running
/// this twice on an unchanged stay writes at most once.
pub async fn reconcile_stay(
    store: &dyn TenantStore,
    stay: &Stay,
    policy: &HotelPolicy,
    now: Timestamp,
) -> Result<StayOutcome, StayError> {
    let stay_id = stay.id;
    let store_err = |e| StayError::from_store(stay_id, e);

    let room = store
        .find_room(stay.room_id)
        .await
        .map_err(store_err)?
        .ok_or(StayError::MissingRoom {
            stay_id,
            room_id: stay.room_id,
        })?;

    let mut bill = store
        .find_open_bill(stay_id)
        .await
        .map_err(store_err)?
        .ok_or(StayError::MissingBill { stay_id })?;

    let charges = compute_charges(&stay.times(), room.price, policy, now);

    let stored_total = bill.total;
    let changed = reconcile_bill(&mut bill, &charges, room.price);
    if !changed && stored_total == bill.total {
        tracing::debug!(stay_id, "Stay charges unchanged");
        return Ok(StayOutcome {
            charges,
            total: bill.total,
            written: false,
        });
    }

    let total = store.save_system_charges(&bill).await.map_err(store_err)?;
    tracing::debug!(
        stay_id,
        nights = charges.nights,
        total = %total,
        "Stay charges reconciled"
    );

    Ok(StayOutcome {
        charges,
        total,
        written: true,
    })
}
