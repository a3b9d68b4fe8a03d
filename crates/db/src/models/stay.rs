//! Guest stays.

use hotelier_core::billing::StayTimes;
use hotelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Stay status while the guest is in house.
pub const STAY_STATUS_CHECKED_IN: &str = "checked_in";
/// Stay status once the guest has left.
pub const STAY_STATUS_CHECKED_OUT: &str = "checked_out";

/// One guest's occupancy of a room.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Stay {
    pub id: DbId,
    pub room_id: DbId,
    pub guest_name: String,
    pub check_in_date: Timestamp,
    pub actual_check_in_date: Option<Timestamp>,
    pub check_out_date: Timestamp,
    pub actual_check_out_date: Option<Timestamp>,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Stay {
    /// The timestamps the billing engine works from.
    pub fn times(&self) -> StayTimes {
        StayTimes {
            check_in_date: self.check_in_date,
            actual_check_in_date: self.actual_check_in_date,
            check_out_date: self.check_out_date,
            actual_check_out_date: self.actual_check_out_date,
        }
    }

    /// Whether a checked-in guest is past the expected check-out at `now`.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.status == STAY_STATUS_CHECKED_IN
            && self.actual_check_out_date.is_none()
            && self.check_out_date < now
    }
}
