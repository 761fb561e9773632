//! # Cancellation Policy
//!
//! Resolves the refund percent for a cancellation, and the price adjustment
//! a customer-choice tier carries.
//!
//! ## Customer Choice
//! ```text
//! ┌────────────────────┬─────────────┬──────────────────────────────┐
//! │  Tier              │  Price      │  Refund                      │
//! ├────────────────────┼─────────────┼──────────────────────────────┤
//! │  ultra_flexible    │  +10%       │  ≥3 days → 100%              │
//! │  standard          │  base       │  ≥15 days → 100%, ≥7 → 50%   │
//! │  non_refundable    │  −10%       │  0%                          │
//! └────────────────────┴─────────────┴──────────────────────────────┘
//! ```
//! The price adjustment is applied to the per-person price BEFORE any
//! automatic discount runs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{ConfigResult, ConfigurationError};
use crate::money::Money;
use crate::percent::Percent;
use crate::settings::{CancellationPolicy, CancellationTier};
use crate::tier::{descending, find_tier};

/// Refund tier a buyer picks at checkout under a customer-choice policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceTier {
    UltraFlexible,
    Standard,
    NonRefundable,
}

impl ChoiceTier {
    pub const ALL: [ChoiceTier; 3] = [
        ChoiceTier::UltraFlexible,
        ChoiceTier::Standard,
        ChoiceTier::NonRefundable,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ChoiceTier::UltraFlexible => "ultra_flexible",
            ChoiceTier::Standard => "standard",
            ChoiceTier::NonRefundable => "non_refundable",
        }
    }

    /// Signed price adjustment in basis points (+1000 = +10%).
    pub const fn price_adjustment_bps(&self) -> i64 {
        match self {
            ChoiceTier::UltraFlexible => 1_000,
            ChoiceTier::Standard => 0,
            ChoiceTier::NonRefundable => -1_000,
        }
    }

    /// Per-person price after the tier's surcharge or reduction; `None` if
    /// the surcharge overflows.
    ///
    /// ```rust
    /// use tourbook_core::cancellation::ChoiceTier;
    /// use tourbook_core::money::Money;
    ///
    /// let base = Money::from_major_minor(100, 0);
    /// assert_eq!(ChoiceTier::NonRefundable.adjust_price(base), Some(Money::from_major_minor(90, 0)));
    /// assert_eq!(ChoiceTier::UltraFlexible.adjust_price(base), Some(Money::from_major_minor(110, 0)));
    /// ```
    pub fn adjust_price(&self, price_per_person: Money) -> Option<Money> {
        price_per_person.checked_scaled(10_000 + self.price_adjustment_bps() as i128, 10_000)
    }

    /// Fixed refund table for this tier.
    pub fn refund_tiers(&self) -> Vec<CancellationTier> {
        match self {
            ChoiceTier::UltraFlexible => {
                vec![CancellationTier::new(3, 100), CancellationTier::new(0, 0)]
            }
            ChoiceTier::Standard => vec![
                CancellationTier::new(15, 100),
                CancellationTier::new(7, 50),
                CancellationTier::new(0, 0),
            ],
            ChoiceTier::NonRefundable => vec![CancellationTier::new(0, 0)],
        }
    }
}

impl fmt::Display for ChoiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoiceTier {
    type Err = ConfigurationError;

    /// Accepts the wire names plus hyphenated / spaced spellings in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ultra_flexible" => Ok(ChoiceTier::UltraFlexible),
            "standard" => Ok(ChoiceTier::Standard),
            "non_refundable" => Ok(ChoiceTier::NonRefundable),
            _ => Err(ConfigurationError::UnknownChoiceTier(s.to_string())),
        }
    }
}

/// Refund percent for cancelling `days_before_tour` days ahead.
///
/// ## Rules
/// - `single`: the policy table (or its preset); below the lowest threshold
///   the lowest tier's percent applies
/// - `customer_choice`: the fixed table for `chosen`, which is required
/// - a tier chosen under a single policy is rejected
///
/// ## Example
/// ```rust
/// use tourbook_core::cancellation::{resolve_refund_percent, ChoiceTier};
/// use tourbook_core::percent::Percent;
/// use tourbook_core::settings::CancellationPolicy;
///
/// let percent = resolve_refund_percent(
///     &CancellationPolicy::CustomerChoice,
///     10,
///     Some(ChoiceTier::Standard),
/// ).unwrap();
/// assert_eq!(percent, Percent::from_whole(50));
/// ```
pub fn resolve_refund_percent(
    policy: &CancellationPolicy,
    days_before_tour: i64,
    chosen: Option<ChoiceTier>,
) -> ConfigResult<Percent> {
    let tiers = match (policy, chosen) {
        (CancellationPolicy::CustomerChoice, Some(tier)) => tier.refund_tiers(),
        (CancellationPolicy::CustomerChoice, None) => {
            return Err(ConfigurationError::MissingChoiceTier)
        }
        (CancellationPolicy::Single { .. }, Some(tier)) => {
            return Err(ConfigurationError::ChoiceNotOffered(tier.to_string()))
        }
        (CancellationPolicy::Single { .. }, None) => policy.single_tiers().unwrap_or_default(),
    };

    if tiers.is_empty() {
        return Err(ConfigurationError::EmptyTiers {
            table: "cancellation".to_string(),
        });
    }

    if let Some(tier) = find_tier(&tiers, days_before_tour) {
        return Ok(tier.refund_percent);
    }

    // Below every threshold: the lowest tier governs
    let lowest = descending(&tiers)
        .last()
        .map(|tier| tier.refund_percent)
        .unwrap_or(Percent::ZERO);
    Ok(lowest)
}

/// Amount refunded when `percent` of `paid` is returned.
pub fn refund_amount(paid: Money, percent: Percent) -> Money {
    paid.percent_of(percent)
}

// =============================================================================
// Unit Tests
// =============================================================================
