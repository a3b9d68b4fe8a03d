use rust_decimal::RoundingStrategy;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Monetary amounts (room prices, charges, bill totals).
pub type Money = rust_decimal::Decimal;

/// Decimal places of every stored amount (`NUMERIC(12,2)`).
pub const MONEY_SCALE: u32 = 2;

/// Round to the stored scale, halves away from zero as Postgres `NUMERIC` does.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
