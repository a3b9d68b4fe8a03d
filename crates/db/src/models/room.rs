use hotelier_core::types::{DbId, Money, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A bookable room with its nightly price.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub number: String,
    pub price: Money,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
