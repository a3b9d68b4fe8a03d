//! Bill line items and in-memory reconciliation of system charges.
//!
//! A bill mixes system-generated items (nightly room charge, early/late
//! surcharges) with items added manually by staff. Reconciliation replaces
//! the system items with a freshly computed set and leaves manual items
//! alone, so running it repeatedly on unchanged inputs is a no-op.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::billing::ChargeBreakdown;
use crate::error::CoreError;
use crate::types::{round_money, DbId, Money};

/// Item code for the nightly room charge.
pub const CODE_NIGHTLY: &str = "nightly";
/// Item code for the early check-in surcharge.
pub const CODE_EARLY_CHECK_IN: &str = "early_check_in";
/// Item code for the late check-out surcharge.
pub const CODE_LATE_CHECK_OUT: &str = "late_check_out";

/// Who created a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOrigin {
    System,
    Manual,
}

/// What a line item bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    RoomCharge,
    ServiceCharge,
}

macro_rules! text_enum {
    ($name:ident { $( $variant:ident => $text:literal ),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(CoreError::Validation(format!(
                        concat!("Unknown ", stringify!($name), " '{}'"),
                        other
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(ItemOrigin { System => "system", Manual => "manual" });
text_enum!(ItemType { RoomCharge => "room_charge", ServiceCharge => "service_charge" });

/// One line on a bill. `id` is `None` until the item has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillItem {
    pub id: Option<DbId>,
    pub origin: ItemOrigin,
    pub item_type: ItemType,
    pub code: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub amount: Money,
}

impl BillItem {
    fn system(
        item_type: ItemType,
        code: &str,
        description: String,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        let unit_price = round_money(unit_price);
        Self {
            id: None,
            origin: ItemOrigin::System,
            item_type,
            code: code.to_string(),
            description,
            quantity,
            unit_price,
            amount: unit_price * Decimal::from(quantity),
        }
    }

    /// Whether this item is one of the system charges owned by reconciliation.
    pub fn is_reconciled_charge(&self) -> bool {
        self.origin == ItemOrigin::System
            && match self.item_type {
                ItemType::RoomCharge => true,
                ItemType::ServiceCharge => {
                    self.code == CODE_EARLY_CHECK_IN || self.code == CODE_LATE_CHECK_OUT
                }
            }
    }
}

/// A stay's bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub id: DbId,
    pub stay_id: DbId,
    pub items: Vec<BillItem>,
    pub total: Money,
}

impl Bill {
    /// Sum of all item amounts.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|i| i.amount).sum()
    }

    /// The system items currently on the bill.
    pub fn system_charges(&self) -> impl Iterator<Item = &BillItem> {
        self.items.iter().filter(|i| i.is_reconciled_charge())
    }
}

/// The system items that represent `charges` for a room at `room_price`.
///
/// Zero-valued surcharges produce no item.
pub fn charge_items(charges: &ChargeBreakdown, room_price: Money) -> Vec<BillItem> {
    let mut items = vec![BillItem::system(
        ItemType::RoomCharge,
        CODE_NIGHTLY,
        format!(
            "Room charge ({} night{})",
            charges.nights,
            if charges.nights == 1 { "" } else { "s" }
        ),
        charges.nights,
        room_price,
    )];

    if !charges.early_check_in_charge.is_zero() {
        items.push(BillItem::system(
            ItemType::ServiceCharge,
            CODE_EARLY_CHECK_IN,
            "Early check-in".to_string(),
            1,
            charges.early_check_in_charge,
        ));
    }
    if !charges.late_check_out_charge.is_zero() {
        items.push(BillItem::system(
            ItemType::ServiceCharge,
            CODE_LATE_CHECK_OUT,
            "Late check-out".to_string(),
            1,
            charges.late_check_out_charge,
        ));
    }

    items
}

/// Replace the bill's system charges with those for `charges` and recompute
/// its total. Returns `true` when the set of system charges changed.
pub fn reconcile_bill(bill: &mut Bill, charges: &ChargeBreakdown, room_price: Money) -> bool {
    let fresh = charge_items(charges, room_price);

    let changed = !same_charges(bill.system_charges(), &fresh);

    bill.items.retain(|item| !item.is_reconciled_charge());
    bill.items.extend(fresh);
    bill.total = bill.items_total();

    changed
}

/// Order-insensitive comparison of charge sets, ignoring persisted ids.
fn same_charges<'a>(current: impl Iterator<Item = &'a BillItem>, fresh: &[BillItem]) -> bool {
    let key = |i: &BillItem| {
        (
            i.code.clone(),
            i.quantity,
            i.unit_price.normalize(),
            i.amount.normalize(),
        )
    };

    let mut current: Vec<_> = current.map(key).collect();
    let mut fresh: Vec<_> = fresh.iter().map(key).collect();
    current.sort();
    fresh.sort();
    current == fresh
}
