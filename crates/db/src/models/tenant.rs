//! Registry tenant record.

use hotelier_core::billing::HotelPolicy;
use hotelier_core::error::CoreError;
use hotelier_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Tenant status value for hotels that are open for business.
pub const TENANT_STATUS_ACTIVE: &str = "active";
/// Tenant status value for suspended or offboarded hotels.
pub const TENANT_STATUS_INACTIVE: &str = "inactive";

/// A hotel registered in the central registry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tenant {
    pub id: DbId,
    /// Lowercase subdomain; the tenant identifier.
    pub subdomain: String,
    pub name: String,
    pub status: String,
    pub standard_check_in_hour: i16,
    pub standard_check_out_hour: i16,
    pub early_check_in_policy: String,
    pub late_check_out_policy: String,
    pub utc_offset_minutes: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TENANT_STATUS_ACTIVE
    }

    /// Parse the stored policy columns.
    ///
    /// A stored policy that fails validation is reported as
    /// [`CoreError::InvariantViolation`].
    pub fn policy(&self) -> Result<HotelPolicy, CoreError> {
        let parse = || {
            HotelPolicy::new(
                i32::from(self.standard_check_in_hour),
                i32::from(self.standard_check_out_hour),
                self.early_check_in_policy.parse()?,
                self.late_check_out_policy.parse()?,
                self.utc_offset_minutes,
            )
        };
        parse().map_err(|e| {
            CoreError::InvariantViolation(format!("tenant '{}' policy: {e}", self.subdomain))
        })
    }
}
