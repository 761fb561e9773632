//! # Percent Type
//!
//! Percentages represented in basis points (bps).
//!
//! 1 basis point = 0.01%, so 700 bps = 7% and 10000 bps = 100%.
//! Tier percents, refund percents, deposit percents and code percents all
//! use this type. On the JSON boundary a `Percent` is a plain number of
//! percent (`7`, `7.5`), matching the guide settings records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Add;
use ts_rs::TS;

use crate::money::div_round_half_even;

/// Basis points in one whole percent.
pub const BPS_PER_WHOLE: u32 = 100;

/// A percentage in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 0%.
    pub const ZERO: Percent = Percent(0);

    /// 100%.
    pub const HUNDRED: Percent = Percent(100 * BPS_PER_WHOLE);

    /// Creates a percent from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percent from whole percent (`from_whole(7)` = 7%).
    #[inline]
    pub const fn from_whole(whole: u32) -> Self {
        Percent(whole * BPS_PER_WHOLE)
    }

    /// Returns the percent in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the percent as a float (for display only).
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / BPS_PER_WHOLE as f64
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks the percent lies within 0-100%.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 <= Percent::HUNDRED.0
    }

    /// Returns `self × numerator / denominator` rounded half-to-even to a
    /// basis point. Used to report a capped line item's share.
    pub fn scaled(&self, numerator: u32, denominator: u32) -> Percent {
        if denominator == 0 {
            return Percent::ZERO;
        }
        let bps = div_round_half_even(
            self.0 as i128 * numerator as i128,
            denominator as i128,
        );
        Percent(bps as u32)
    }
}

impl Add for Percent {
    type Output = Percent;

    #[inline]
    fn add(self, other: Percent) -> Percent {
        Percent(self.0 + other.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / BPS_PER_WHOLE;
        let frac = self.0 % BPS_PER_WHOLE;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % BPS_PER_WHOLE == 0 {
            serializer.serialize_u32(self.0 / BPS_PER_WHOLE)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "percent must be a non-negative number, got {}",
                value
            )));
        }
        let bps = (value * BPS_PER_WHOLE as f64).round();
        if bps > u32::MAX as f64 {
            return Err(serde::de::Error::custom("percent is too large"));
        }
        Ok(Percent(bps as u32))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
