//! Billing policy engine.
//!
//! Computes the nightly room charge plus early-check-in and late-check-out
//! surcharges for a stay under a hotel's policy. The computation is pure:
//! the evaluation instant for ongoing stays is passed in by the caller,
//! so the same inputs always produce the same breakdown.

use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{round_money, Money, Timestamp};

/// Check-ins before this local hour are billed as a full extra night,
/// whatever the hotel's early-check-in policy says.
pub const EARLY_FULL_NIGHT_BEFORE_HOUR: u32 = 6;

/// Check-outs after this local hour are billed as a full extra night,
/// whatever the hotel's late-check-out policy says.
pub const LATE_FULL_NIGHT_AFTER_HOUR: u32 = 18;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// How an early check-in or late check-out inside the grace window is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargePolicy {
    Free,
    HalfRate,
    FullRate,
}

impl ChargePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::HalfRate => "half_rate",
            Self::FullRate => "full_rate",
        }
    }

    /// Surcharge for one room night at `price` under this policy, rounded
    /// to cents.
    pub fn apply(self, price: Money) -> Money {
        match self {
            Self::Free => Decimal::ZERO,
            Self::HalfRate => round_money(price * Decimal::new(5, 1)),
            Self::FullRate => round_money(price),
        }
    }
}

impl FromStr for ChargePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "half_rate" => Ok(Self::HalfRate),
            "full_rate" => Ok(Self::FullRate),
            other => Err(CoreError::Validation(format!(
                "Unknown charge policy '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ChargePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hotel's check-in/check-out policy.
///
/// Hours are local to the hotel, which is described by a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HotelPolicy {
    pub standard_check_in_hour: u32,
    pub standard_check_out_hour: u32,
    pub early_check_in: ChargePolicy,
    pub late_check_out: ChargePolicy,
    #[serde(serialize_with = "serialize_offset")]
    pub utc_offset: FixedOffset,
}

impl HotelPolicy {
    /// Build a policy, rejecting hours outside 0-23 and offsets beyond +/-24h.
    pub fn new(
        standard_check_in_hour: i32,
        standard_check_out_hour: i32,
        early_check_in: ChargePolicy,
        late_check_out: ChargePolicy,
        utc_offset_minutes: i32,
    ) -> Result<Self, CoreError> {
        let standard_check_in_hour =
            validate_hour("standard_check_in_hour", standard_check_in_hour)?;
        let standard_check_out_hour =
            validate_hour("standard_check_out_hour", standard_check_out_hour)?;
        let utc_offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                CoreError::Validation(format!("Invalid UTC offset: {utc_offset_minutes} minutes"))
            })?;

        Ok(Self {
            standard_check_in_hour,
            standard_check_out_hour,
            early_check_in,
            late_check_out,
            utc_offset,
        })
    }
}

fn validate_hour(field: &str, hour: i32) -> Result<u32, CoreError> {
    u32::try_from(hour)
        .ok()
        .filter(|h| *h <= 23)
        .ok_or_else(|| CoreError::Validation(format!("{field} must be 0-23, got {hour}")))
}

fn serialize_offset<S: serde::Serializer>(offset: &FixedOffset, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i32(offset.local_minus_utc() / 60)
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// The timestamps of a stay that drive billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayTimes {
    /// Expected check-in.
    pub check_in_date: Timestamp,
    pub actual_check_in_date: Option<Timestamp>,
    /// Expected check-out.
    pub check_out_date: Timestamp,
    /// `None` while the guest is still in house.
    pub actual_check_out_date: Option<Timestamp>,
}

impl StayTimes {
    pub fn effective_check_in(&self) -> Timestamp {
        self.actual_check_in_date.unwrap_or(self.check_in_date)
    }

    /// The recorded check-out, or `now` for an ongoing stay. An ongoing stay
    /// keeps accruing past its expected check-out.
    pub fn effective_check_out(&self, now: Timestamp) -> Timestamp {
        self.actual_check_out_date.unwrap_or(now)
    }
}

/// Result of [`compute_charges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeBreakdown {
    pub nights: i64,
    pub base_charge: Money,
    pub early_check_in_charge: Money,
    pub late_check_out_charge: Money,
    pub total: Money,
}

/// Compute the charges for a stay in a room priced `room_price` per night.
///
/// Nights are counted between the hotel-local calendar dates of the
/// effective check-in and check-out, with a minimum of one night. Hours
/// outside the standard window add a surcharge on top. Every amount is
/// rounded to cents, so the breakdown matches what a bill stores.
pub fn compute_charges(
    stay: &StayTimes,
    room_price: Money,
    policy: &HotelPolicy,
    now: Timestamp,
) -> ChargeBreakdown {
    let room_price = round_money(room_price);
    let check_in = stay.effective_check_in().with_timezone(&policy.utc_offset);
    let check_out = stay.effective_check_out(now).with_timezone(&policy.utc_offset);

    let nights = (check_out.date_naive() - check_in.date_naive())
        .num_days()
        .max(1);
    let base_charge = room_price * Decimal::from(nights);

    let early_check_in_charge = early_check_in_charge(check_in.hour(), room_price, policy);
    let late_check_out_charge = late_check_out_charge(check_out.hour(), room_price, policy);

    ChargeBreakdown {
        nights,
        base_charge,
        early_check_in_charge,
        late_check_out_charge,
        total: base_charge + early_check_in_charge + late_check_out_charge,
    }
}

fn early_check_in_charge(hour: u32, price: Money, policy: &HotelPolicy) -> Money {
    if hour >= policy.standard_check_in_hour {
        Decimal::ZERO
    } else if hour < EARLY_FULL_NIGHT_BEFORE_HOUR {
        price
    } else {
        policy.early_check_in.apply(price)
    }
}

fn late_check_out_charge(hour: u32, price: Money, policy: &HotelPolicy) -> Money {
    if hour <= policy.standard_check_out_hour {
        Decimal::ZERO
    } else if hour > LATE_FULL_NIGHT_AFTER_HOUR {
        price
    } else {
        policy.late_check_out.apply(price)
    }
}
