//! Repository for the tenant `bills` and `bill_items` tables.

use hotelier_core::bill::{BillItem, CODE_EARLY_CHECK_IN, CODE_LATE_CHECK_OUT};
use hotelier_core::types::{DbId, Money};
use sqlx::PgPool;

use crate::models::bill::{BillItemRow, BillRow, BILL_STATUS_OPEN};

/// Column list for `bills` queries.
const COLUMNS: &str = "id, stay_id, status, total, created_at, updated_at";

/// Column list for `bill_items` queries.
const ITEM_COLUMNS: &str = "\
    id, bill_id, origin, item_type, code, description, \
    quantity, unit_price, amount, created_at";

/// Provides query operations for bills and their items.
pub struct BillRepo;

impl BillRepo {
    // ── Queries ──────────────────────────────────────────────────────

    /// Find the open bill for a stay.
    pub async fn find_open_by_stay(
        pool: &PgPool,
        stay_id: DbId,
    ) -> Result<Option<BillRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bills WHERE stay_id = $1 AND status = $2");
        sqlx::query_as::<_, BillRow>(&query)
            .bind(stay_id)
            .bind(BILL_STATUS_OPEN)
            .fetch_optional(pool)
            .await
    }

    /// List a bill's items in insertion order.
    pub async fn list_items(
        pool: &PgPool,
        bill_id: DbId,
    ) -> Result<Vec<BillItemRow>, sqlx::Error> {
        let query =
            format!("SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, BillItemRow>(&query)
            .bind(bill_id)
            .fetch_all(pool)
            .await
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace a bill's system room charge and early/late surcharges with
    /// `items`, then recompute the stored total from all items.
    ///
    /// Runs in one transaction holding a row lock on the bill, so concurrent
    /// reconciliations of the same bill are applied one after the other and
    /// readers never see a bill without its system charges. Returns the new
    /// total.
    pub async fn replace_system_charges(
        pool: &PgPool,
        bill_id: DbId,
        items: &[BillItem],
    ) -> Result<Money, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM bills WHERE id = $1 FOR UPDATE")
            .bind(bill_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "DELETE FROM bill_items \
             WHERE bill_id = $1 \
               AND origin = 'system' \
               AND (item_type = 'room_charge' OR code IN ($2, $3))",
        )
        .bind(bill_id)
        .bind(CODE_EARLY_CHECK_IN)
        .bind(CODE_LATE_CHECK_OUT)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO bill_items \
                 (bill_id, origin, item_type, code, description, quantity, unit_price, amount) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(bill_id)
            .bind(item.origin.as_str())
            .bind(item.item_type.as_str())
            .bind(&item.code)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.amount)
            .execute(&mut *tx)
            .await?;
        }

        let total: Money = sqlx::query_scalar(
            "UPDATE bills \
             SET total = COALESCE((SELECT SUM(amount) FROM bill_items WHERE bill_id = $1), 0), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING total",
        )
        .bind(bill_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(total)
    }
}
