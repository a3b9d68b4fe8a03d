//! Repository for the tenant `stays` table.

use hotelier_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::stay::{Stay, STAY_STATUS_CHECKED_IN};

/// Column list for `stays` queries.
const COLUMNS: &str = "\
    id, room_id, guest_name, \
    check_in_date, actual_check_in_date, check_out_date, actual_check_out_date, \
    status, created_at, updated_at";

/// Provides query operations for stays.
pub struct StayRepo;

impl StayRepo {
    /// List every stay whose guest is currently checked in.
    pub async fn list_checked_in(pool: &PgPool) -> Result<Vec<Stay>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stays WHERE status = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Stay>(&query)
            .bind(STAY_STATUS_CHECKED_IN)
            .fetch_all(pool)
            .await
    }

    /// List checked-in stays whose expected check-out is before `now`.
    pub async fn list_overdue(pool: &PgPool, now: Timestamp) -> Result<Vec<Stay>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stays \
             WHERE status = $1 \
               AND actual_check_out_date IS NULL \
               AND check_out_date < $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Stay>(&query)
            .bind(STAY_STATUS_CHECKED_IN)
            .bind(now)
            .fetch_all(pool)
            .await
    }
}
