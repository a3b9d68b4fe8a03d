//! Repository for the tenant `rooms` table.

use hotelier_core::types::DbId;
use sqlx::PgPool;

use crate::models::room::Room;

const COLUMNS: &str = "id, number, price, created_at, updated_at";

pub struct RoomRepo;

impl RoomRepo {
    /// Find a room by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM rooms WHERE id = $1");
        sqlx::query_as::<_, Room>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
