//! Bills and their line items.

use hotelier_core::bill::{Bill, BillItem};
use hotelier_core::error::CoreError;
use hotelier_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Bill status while charges may still change.
pub const BILL_STATUS_OPEN: &str = "open";
/// Bill status once the guest has paid.
pub const BILL_STATUS_SETTLED: &str = "settled";

/// A row in `bills`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillRow {
    pub id: DbId,
    pub stay_id: DbId,
    pub status: String,
    pub total: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row in `bill_items`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillItemRow {
    pub id: DbId,
    pub bill_id: DbId,
    pub origin: String,
    pub item_type: String,
    pub code: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub amount: Money,
    pub created_at: Timestamp,
}

impl TryFrom<BillItemRow> for BillItem {
    type Error = CoreError;

    fn try_from(row: BillItemRow) -> Result<Self, Self::Error> {
        Ok(BillItem {
            id: Some(row.id),
            origin: row.origin.parse()?,
            item_type: row.item_type.parse()?,
            code: row.code,
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            amount: row.amount,
        })
    }
}

impl BillRow {
    /// Assemble the domain bill from this row and its item rows.
    pub fn into_bill(self, items: Vec<BillItemRow>) -> Result<Bill, CoreError> {
        let items = items
            .into_iter()
            .map(BillItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Bill {
            id: self.id,
            stay_id: self.stay_id,
            items,
            total: self.total,
        })
    }
}
