//! # Discount Engine
//!
//! Early-bird, group-size and last-minute discounts, stacked under the
//! global cap.
//!
//! ## Stacking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = price_per_person × participants                             │
//! │                                                                         │
//! │  early-bird  (days)  ──┐                                                │
//! │  group       (count) ──┼──► raw = Σ ──► effective = min(raw, 40%)      │
//! │  last-minute (hours) ──┘                                                │
//! │                                                                         │
//! │  total = round(subtotal × effective)          ← rounded ONCE            │
//! │  line_i = round(subtotal × p_i / raw × effective)                       │
//! │  residual cent(s) → line with the largest raw percent                   │
//! │                                                                         │
//! │  Σ line_i == total, always                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When the cap does not trigger `effective == raw`, so each line is simply
//! its own percent of the subtotal. When it does, each line keeps its share
//! of the raw stack (30/50 and 20/50 of a 40% cap → 24% and 16%).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ConfigResult, ConfigurationError};
use crate::money::Money;
use crate::percent::Percent;
use crate::settings::{EarlyBirdSettings, GroupDiscountSettings, LastMinuteSettings};
use crate::tier::resolve;
use crate::STACKING_CAP;

const HOURS_PER_DAY: i64 = 24;

// =============================================================================
// Lead Time
// =============================================================================

/// Time between booking and departure, in whole hours.
///
/// Negative when the booking happens after the tour started; that is a
/// caller error the engine does not reject (no early-bird tier matches).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadTime {
    hours: i64,
}

impl LeadTime {
    #[inline]
    pub const fn from_hours(hours: i64) -> Self {
        LeadTime { hours }
    }

    /// `from_days(d)` is exactly `d × 24` hours.
    #[inline]
    pub const fn from_days(days: i64) -> Self {
        LeadTime {
            hours: days * HOURS_PER_DAY,
        }
    }

    /// Lead time from `booked_at` until `tour_start`, truncated to hours.
    pub fn between(booked_at: DateTime<Utc>, tour_start: DateTime<Utc>) -> Self {
        LeadTime {
            hours: (tour_start - booked_at).num_hours(),
        }
    }

    #[inline]
    pub const fn hours(&self) -> i64 {
        self.hours
    }

    /// Whole days until the tour (floored).
    #[inline]
    pub const fn days(&self) -> i64 {
        self.hours.div_euclid(HOURS_PER_DAY)
    }
}

// =============================================================================
// Stacked Discount
// =============================================================================

/// Result of stacking the automatic discounts on one subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StackedDiscount {
    pub subtotal: Money,

    /// Tier percents as resolved, before the cap.
    pub early_bird_percent: Percent,
    pub group_percent: Percent,
    pub last_minute_percent: Percent,
    pub raw_stacked_percent: Percent,

    /// `min(raw, cap)`.
    pub effective_percent: Percent,

    pub early_bird_discount: Money,
    pub group_discount: Money,
    pub last_minute_discount: Money,

    /// Always `early_bird + group + last_minute`.
    pub total_discount: Money,
}

impl StackedDiscount {
    /// Whether the stacking cap cut the raw sum.
    #[inline]
    pub fn capped(&self) -> bool {
        self.raw_stacked_percent > self.effective_percent
    }

    /// Subtotal after automatic discounts.
    #[inline]
    pub fn discounted_subtotal(&self) -> Money {
        self.subtotal - self.total_discount
    }

    /// Percent each line item actually contributes, in early-bird, group,
    /// last-minute order. Equal to the raw percents unless capped.
    pub fn reported_percents(&self) -> [Percent; 3] {
        let raw = self.raw_stacked_percent.bps();
        let effective = self.effective_percent.bps();
        [
            self.early_bird_percent,
            self.group_percent,
            self.last_minute_percent,
        ]
        .map(|p| p.scaled(effective, raw))
    }
}

/// Stacks early-bird, group and last-minute discounts on
/// `price_per_person × participants`.
///
/// ## Example
/// ```rust
/// use tourbook_core::discount::{apply_discounts, LeadTime};
/// use tourbook_core::money::Money;
/// use tourbook_core::percent::Percent;
/// use tourbook_core::settings::{EarlyBirdSettings, GroupDiscountSettings, LastMinuteSettings};
///
/// let stacked = apply_discounts(
///     Money::from_major_minor(250, 0),
///     4,
///     LeadTime::from_days(45),
///     &EarlyBirdSettings::conventional(),
///     &GroupDiscountSettings::conventional(),
///     &LastMinuteSettings::default(),
/// )
/// .unwrap();
/// assert_eq!(stacked.effective_percent, Percent::from_whole(17));
/// assert_eq!(stacked.total_discount, Money::from_major_minor(170, 0));
/// ```
pub fn apply_discounts(
    price_per_person: Money,
    participants: u32,
    lead_time: LeadTime,
    early_bird: &EarlyBirdSettings,
    group: &GroupDiscountSettings,
    last_minute: &LastMinuteSettings,
) -> ConfigResult<StackedDiscount> {
    let subtotal = price_per_person.checked_mul_count(participants).ok_or_else(|| {
        ConfigurationError::AmountOverflow {
            field: "subtotal".to_string(),
        }
    })?;

    let early_bird_percent = if early_bird.enabled {
        resolve(&early_bird.tiers, lead_time.days())
    } else {
        Percent::ZERO
    };

    let group_percent = if group.enabled && participants >= 1 {
        resolve(&group.tiers, participants as i64)
    } else {
        Percent::ZERO
    };

    let last_minute_percent =
        if last_minute.enabled && lead_time.hours() <= last_minute.hours_or_less {
            last_minute.percent
        } else {
            Percent::ZERO
        };

    let raw = early_bird_percent + group_percent + last_minute_percent;
    let effective = raw.min(STACKING_CAP);

    let [early_bird_discount, group_discount, last_minute_discount] = allocate(
        subtotal,
        [early_bird_percent, group_percent, last_minute_percent],
        raw,
        effective,
    );

    Ok(StackedDiscount {
        subtotal,
        early_bird_percent,
        group_percent,
        last_minute_percent,
        raw_stacked_percent: raw,
        effective_percent: effective,
        early_bird_discount,
        group_discount,
        last_minute_discount,
        total_discount: early_bird_discount + group_discount + last_minute_discount,
    })
}

/// Splits `subtotal × effective` across the line items in proportion to
/// their raw percents. The result sums exactly to the rounded total, which
/// never exceeds the exact cap.
fn allocate(subtotal: Money, percents: [Percent; 3], raw: Percent, effective: Percent) -> [Money; 3] {
    if raw.is_zero() {
        return [Money::zero(); 3];
    }

    // Half-even rounding can lift tiny subtotals over the cap even below it
    let total = subtotal
        .percent_of(effective)
        .min(subtotal.percent_of_floor(STACKING_CAP));

    let denominator = raw.bps() as i128 * 10_000;
    let mut lines = percents.map(|p| subtotal.scaled(p.bps() as i128 * effective.bps() as i128, denominator));

    let allocated: Money = lines.iter().copied().sum();
    let mut residual = total - allocated;
    if residual.is_positive() {
        lines[largest_index(&percents)] += residual;
    } else {
        // Take surplus cents back from the largest lines first, never below zero
        for i in by_percent_desc(&percents) {
            if !residual.is_negative() {
                break;
            }
            let take = lines[i].min(Money::zero() - residual);
            lines[i] -= take;
            residual += take;
        }
    }

    lines
}

/// Line indices ordered by descending percent; earlier lines win ties.
fn by_percent_desc(percents: &[Percent; 3]) -> [usize; 3] {
    let mut order = [0, 1, 2];
    order.sort_by(|a, b| percents[*b].cmp(&percents[*a]));
    order
}

/// Index of the largest percent; the first one wins ties.
fn largest_index(percents: &[Percent; 3]) -> usize {
    let mut best = 0;
    for (i, p) in percents.iter().enumerate() {
        if *p > percents[best] {
            best = i;
        }
    }
    best
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{EarlyBirdTier, GroupTier};

    fn stack(price: Money, participants: u32, lead: LeadTime) -> StackedDiscount {
        apply_discounts(
            price,
            participants,
            lead,
            &EarlyBirdSettings::conventional(),
            &GroupDiscountSettings::conventional(),
            &LastMinuteSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_documented_preview_default() {
        let stacked = stack(Money::from_major_minor(250, 0), 4, LeadTime::from_days(45));

        assert_eq!(stacked.subtotal, Money::from_major_minor(1000, 0));
        assert_eq!(stacked.early_bird_percent, Percent::from_whole(7));
        assert_eq!(stacked.group_percent, Percent::from_whole(10));
        assert_eq!(stacked.effective_percent, Percent::from_whole(17));
        assert_eq!(stacked.early_bird_discount, Money::from_major_minor(70, 0));
        assert_eq!(stacked.group_discount, Money::from_major_minor(100, 0));
        assert_eq!(stacked.total_discount, Money::from_major_minor(170, 0));
        assert!(!stacked.capped());
    }

    #[test]
    fn test_cap_splits_proportionally() {
        let early_bird = EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 60,
                percent: Percent::from_whole(30),
            }],
        };
        let group = GroupDiscountSettings {
            enabled: true,
            tiers: vec![GroupTier {
                min_count: 6,
                max_count: None,
                percent: Percent::from_whole(20),
            }],
        };

        let stacked = apply_discounts(
            Money::from_major_minor(250, 0),
            6,
            LeadTime::from_days(70),
            &early_bird,
            &group,
            &LastMinuteSettings::default(),
        )
        .unwrap();

        assert_eq!(stacked.raw_stacked_percent, Percent::from_whole(50));
        assert_eq!(stacked.effective_percent, Percent::from_whole(40));
        assert!(stacked.capped());
        assert_eq!(
            stacked.reported_percents(),
            [Percent::from_whole(24), Percent::from_whole(16), Percent::ZERO]
        );
        // 1500.00 × 24% and × 16%
        assert_eq!(stacked.early_bird_discount, Money::from_major_minor(360, 0));
        assert_eq!(stacked.group_discount, Money::from_major_minor(240, 0));
        assert_eq!(stacked.total_discount, Money::from_major_minor(600, 0));
    }

    #[test]
    fn test_last_minute_window_in_hours() {
        let last_minute = LastMinuteSettings {
            enabled: true,
            hours_or_less: 48,
            percent: Percent::from_whole(10),
        };
        let price = Money::from_major_minor(100, 0);

        let inside = apply_discounts(
            price,
            1,
            LeadTime::from_hours(48),
            &EarlyBirdSettings::disabled(),
            &GroupDiscountSettings::disabled(),
            &last_minute,
        )
        .unwrap();
        assert_eq!(inside.last_minute_discount, Money::from_major_minor(10, 0));

        let outside = apply_discounts(
            price,
            1,
            LeadTime::from_hours(49),
            &EarlyBirdSettings::disabled(),
            &GroupDiscountSettings::disabled(),
            &last_minute,
        )
        .unwrap();
        assert!(outside.last_minute_discount.is_zero());

        // daysUntilTour = 2 means 48 hours
        let from_days = apply_discounts(
            price,
            1,
            LeadTime::from_days(2),
            &EarlyBirdSettings::disabled(),
            &GroupDiscountSettings::disabled(),
            &last_minute,
        )
        .unwrap();
        assert_eq!(from_days.last_minute_percent, Percent::from_whole(10));
    }

    #[test]
    fn test_disabled_settings_contribute_nothing() {
        let stacked = apply_discounts(
            Money::from_major_minor(250, 0),
            8,
            LeadTime::from_days(90),
            &EarlyBirdSettings {
                enabled: false,
                ..EarlyBirdSettings::conventional()
            },
            &GroupDiscountSettings {
                enabled: false,
                ..GroupDiscountSettings::conventional()
            },
            &LastMinuteSettings::default(),
        )
        .unwrap();
        assert!(stacked.total_discount.is_zero());
        assert!(stacked.raw_stacked_percent.is_zero());
    }

    #[test]
    fn test_zero_participants_and_negative_lead_time() {
        let stacked = stack(Money::from_major_minor(250, 0), 0, LeadTime::from_days(45));
        assert!(stacked.group_percent.is_zero());
        assert!(stacked.subtotal.is_zero());

        let late = stack(Money::from_major_minor(250, 0), 1, LeadTime::from_days(-3));
        assert!(late.early_bird_percent.is_zero());
    }

    #[test]
    fn test_stacking_cap_never_exceeded() {
        let early_bird = EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 0,
                percent: Percent::from_whole(35),
            }],
        };
        let group = GroupDiscountSettings {
            enabled: true,
            tiers: vec![GroupTier {
                min_count: 1,
                max_count: None,
                percent: Percent::from_whole(15),
            }],
        };
        let last_minute = LastMinuteSettings {
            enabled: true,
            hours_or_less: 10_000,
            percent: Percent::from_whole(25),
        };

        for cents in 1..=2_500 {
            for participants in [1, 3, 7] {
                let stacked = apply_discounts(
                    Money::from_cents(cents),
                    participants,
                    LeadTime::from_days(5),
                    &early_bird,
                    &group,
                    &last_minute,
                )
                .unwrap();
                let subtotal = stacked.subtotal.cents();
                assert!(stacked.total_discount.cents() * 100 <= subtotal * 40);
                assert_eq!(
                    stacked.early_bird_discount
                        + stacked.group_discount
                        + stacked.last_minute_discount,
                    stacked.total_discount
                );
                assert!(!stacked.early_bird_discount.is_negative());
                assert!(!stacked.group_discount.is_negative());
                assert!(!stacked.last_minute_discount.is_negative());
            }
        }
    }

    #[test]
    fn test_line_items_sum_to_total_with_odd_cents() {
        let early_bird = EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 0,
                percent: Percent::from_bps(333),
            }],
        };
        let group = GroupDiscountSettings {
            enabled: true,
            tiers: vec![GroupTier {
                min_count: 1,
                max_count: None,
                percent: Percent::from_bps(667),
            }],
        };

        for cents in [1, 7, 99, 1001, 33_333] {
            let stacked = apply_discounts(
                Money::from_cents(cents),
                1,
                LeadTime::from_days(1),
                &early_bird,
                &group,
                &LastMinuteSettings::default(),
            )
            .unwrap();
            assert_eq!(
                stacked.early_bird_discount + stacked.group_discount,
                Money::from_cents(cents).percent_of(Percent::from_whole(10))
            );
        }
    }

    #[test]
    fn test_cent_subtotals_stay_under_cap_below_it() {
        let early_bird = EarlyBirdSettings {
            enabled: true,
            tiers: vec![EarlyBirdTier {
                days_or_more: 60,
                percent: Percent::from_whole(28),
            }],
        };
        let group = GroupDiscountSettings {
            enabled: true,
            tiers: vec![GroupTier {
                min_count: 2,
                max_count: None,
                percent: Percent::from_whole(10),
            }],
        };

        for (participants, expected_total) in [(2, 0), (4, 1)] {
            let stacked = apply_discounts(
                Money::from_cents(1),
                participants,
                LeadTime::from_days(90),
                &early_bird,
                &group,
                &LastMinuteSettings::default(),
            )
            .unwrap();

            // 38% of 2 cents rounds to 1, but 40% of 2 cents floors to 0
            assert_eq!(stacked.raw_stacked_percent, Percent::from_whole(38));
            assert!(!stacked.capped());
            assert_eq!(stacked.total_discount, Money::from_cents(expected_total));
            assert!(stacked.total_discount.cents() * 100 <= stacked.subtotal.cents() * 40);
            assert_eq!(
                stacked.early_bird_discount + stacked.group_discount,
                stacked.total_discount
            );
            assert!(!stacked.early_bird_discount.is_negative());
            assert!(!stacked.group_discount.is_negative());
        }
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let err = apply_discounts(
            Money::from_cents(i64::MAX / 2),
            3,
            LeadTime::from_days(45),
            &EarlyBirdSettings::conventional(),
            &GroupDiscountSettings::conventional(),
            &LastMinuteSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::AmountOverflow { .. }));
    }

    #[test]
    fn test_early_bird_monotonic_in_days() {
        let settings = EarlyBirdSettings::conventional();
        let mut previous = Percent::ZERO;
        for days in -10..200 {
            let percent = resolve(&settings.tiers, days);
            assert!(percent >= previous, "dropped at {} days", days);
            previous = percent;
        }
    }

    #[test]
    fn test_lead_time_between_instants() {
        let booked = DateTime::parse_from_rfc3339("2026-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let start = DateTime::parse_from_rfc3339("2026-05-03T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let lead = LeadTime::between(booked, start);
        assert_eq!(lead.hours(), 47);
        assert_eq!(lead.days(), 1);
        assert_eq!(LeadTime::from_hours(-1).days(), -1);
    }
}
