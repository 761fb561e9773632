//! # Tier Resolution
//!
//! The "find the matching threshold tier" primitive behind every discount
//! and refund lookup.
//!
//! ## Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Early-bird tiers (any input order)    value = 45 days                  │
//! │                                                                         │
//! │  sorted by threshold, highest first:                                    │
//! │    ≥60 → 10%   45 >= 60? no                                             │
//! │    ≥30 →  7%   45 >= 30? YES ─► 7%   (stop, no blending)               │
//! │    ≥14 →  5%                                                            │
//! │                                                                         │
//! │  nothing matches ─► 0%                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Overlapping tables are rejected by settings validation, but the resolver
//! itself still has a defined answer for them: the first matching tier in
//! descending threshold order wins, and tiers with equal thresholds keep
//! their input order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::percent::Percent;

/// A row of a threshold table.
pub trait Tier {
    /// Lower bound used for ordering (days, participants, ...).
    fn threshold(&self) -> i64;

    /// Whether `value` falls inside this tier.
    fn matches(&self, value: i64) -> bool;

    /// Percent granted by this tier.
    fn percent(&self) -> Percent;
}

/// Plain `value >= min_inclusive` tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TierThreshold {
    pub min_inclusive: i64,
    pub percent: Percent,
}

impl TierThreshold {
    pub const fn new(min_inclusive: i64, percent: Percent) -> Self {
        TierThreshold {
            min_inclusive,
            percent,
        }
    }
}

impl Tier for TierThreshold {
    fn threshold(&self) -> i64 {
        self.min_inclusive
    }

    fn matches(&self, value: i64) -> bool {
        value >= self.min_inclusive
    }

    fn percent(&self) -> Percent {
        self.percent
    }
}

/// Returns the tiers ordered highest threshold first (stable).
pub fn descending<T: Tier>(tiers: &[T]) -> Vec<&T> {
    let mut ordered: Vec<&T> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.threshold().cmp(&a.threshold()));
    ordered
}

/// Finds the tier that applies to `value`, if any.
pub fn find_tier<T: Tier>(tiers: &[T], value: i64) -> Option<&T> {
    descending(tiers).into_iter().find(|tier| tier.matches(value))
}

/// Resolves the percent for `value`; `0%` when no tier matches.
///
/// ## Example
/// ```rust
/// use tourbook_core::percent::Percent;
/// use tourbook_core::tier::{resolve, TierThreshold};
///
/// let tiers = [
///     TierThreshold::new(14, Percent::from_whole(5)),
///     TierThreshold::new(60, Percent::from_whole(10)),
///     TierThreshold::new(30, Percent::from_whole(7)),
/// ];
/// assert_eq!(resolve(&tiers, 45), Percent::from_whole(7));
/// assert_eq!(resolve(&tiers, 3), Percent::ZERO);
/// ```
pub fn resolve<T: Tier>(tiers: &[T], value: i64) -> Percent {
    find_tier(tiers, value)
        .map(|tier| tier.percent())
        .unwrap_or(Percent::ZERO)
}

// =============================================================================
// Unit Tests
// =============================================================================
