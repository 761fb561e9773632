//! # Policy Settings
//!
//! Guide-owned pricing settings, as read from the configuration store.
//!
//! ## Settings Snapshot
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PolicySettings (immutable snapshot per calculation)                    │
//! │                                                                         │
//! │  ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐           │
//! │  │   earlyBird     │ │ groupDiscount   │ │   lastMinute    │           │
//! │  │  ≥60d → 10%     │ │  2-3 → 5%       │ │  ≤48h → 10%     │           │
//! │  │  ≥30d →  7%     │ │  4-5 → 10%      │ │  (off)          │           │
//! │  │  ≥14d →  5%     │ │  6+  → 15%      │ │                 │           │
//! │  └─────────────────┘ └─────────────────┘ └─────────────────┘           │
//! │  ┌─────────────────────────┐ ┌─────────────────────────────────┐       │
//! │  │  deposit                │ │  cancellation                   │       │
//! │  │  percentage 30%, T-14d  │ │  single(moderate) | customer    │       │
//! │  └─────────────────────────┘ └─────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Validation
//! Records arrive as JSON. [`PolicySettings::from_json`] parses them into the
//! tagged types below and runs [`PolicySettings::validate`], so the engine only
//! ever prices well-formed tables.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{ConfigResult, ConfigurationError, PricingResult};
use crate::percent::Percent;
use crate::tier::Tier;
use crate::{DEPOSIT_MAX_PERCENT, DEPOSIT_MIN_PERCENT, MAX_FINAL_PAYMENT_DAYS_BEFORE};

// =============================================================================
// Early Bird
// =============================================================================

/// `days_until_tour >= days_or_more` earns `percent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EarlyBirdTier {
    pub days_or_more: i64,
    pub percent: Percent,
}

impl Tier for EarlyBirdTier {
    fn threshold(&self) -> i64 {
        self.days_or_more
    }

    fn matches(&self, value: i64) -> bool {
        value >= self.days_or_more
    }

    fn percent(&self) -> Percent {
        self.percent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EarlyBirdSettings {
    pub enabled: bool,
    #[serde(default)]
    pub tiers: Vec<EarlyBirdTier>,
}

impl EarlyBirdSettings {
    /// Returns the conventional 60/10, 30/7, 14/5 table.
    pub fn conventional() -> Self {
        EarlyBirdSettings {
            enabled: true,
            tiers: vec![
                EarlyBirdTier {
                    days_or_more: 60,
                    percent: Percent::from_whole(10),
                },
                EarlyBirdTier {
                    days_or_more: 30,
                    percent: Percent::from_whole(7),
                },
                EarlyBirdTier {
                    days_or_more: 14,
                    percent: Percent::from_whole(5),
                },
            ],
        }
    }

    /// Disabled settings with no tiers.
    pub fn disabled() -> Self {
        EarlyBirdSettings {
            enabled: false,
            tiers: Vec::new(),
        }
    }
}

impl Default for EarlyBirdSettings {
    fn default() -> Self {
        EarlyBirdSettings::conventional()
    }
}

// =============================================================================
// Group Discount
// =============================================================================

/// `min_count <= participants <= max_count` earns `percent`.
/// A missing `max_count` is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GroupTier {
    pub min_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<i64>,
    pub percent: Percent,
}

impl Tier for GroupTier {
    fn threshold(&self) -> i64 {
        self.min_count
    }

    fn matches(&self, value: i64) -> bool {
        value >= self.min_count && self.max_count.map_or(true, |max| value <= max)
    }

    fn percent(&self) -> Percent {
        self.percent
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiscountSettings {
    pub enabled: bool,
    #[serde(default)]
    pub tiers: Vec<GroupTier>,
}

impl GroupDiscountSettings {
    /// Returns the conventional 2-3 → 5%, 4-5 → 10%, 6+ → 15% table.
    pub fn conventional() -> Self {
        GroupDiscountSettings {
            enabled: true,
            tiers: vec![
                GroupTier {
                    min_count: 2,
                    max_count: Some(3),
                    percent: Percent::from_whole(5),
                },
                GroupTier {
                    min_count: 4,
                    max_count: Some(5),
                    percent: Percent::from_whole(10),
                },
                GroupTier {
                    min_count: 6,
                    max_count: None,
                    percent: Percent::from_whole(15),
                },
            ],
        }
    }

    pub fn disabled() -> Self {
        GroupDiscountSettings {
            enabled: false,
            tiers: Vec::new(),
        }
    }
}

impl Default for GroupDiscountSettings {
    fn default() -> Self {
        GroupDiscountSettings::conventional()
    }
}

// =============================================================================
// Last Minute
// =============================================================================

/// Bookings made `hours_or_less` hours before departure earn `percent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LastMinuteSettings {
    pub enabled: bool,
    pub hours_or_less: i64,
    pub percent: Percent,
}

impl Default for LastMinuteSettings {
    /// Off by default; 48 hours / 10% once a guide switches it on.
    fn default() -> Self {
        LastMinuteSettings {
            enabled: false,
            hours_or_less: 48,
            percent: Percent::from_whole(10),
        }
    }
}

// =============================================================================
// Deposit Policy
// =============================================================================

/// How the final price is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DepositPolicy {
    /// Full charge at booking time.
    None,
    /// Deposit now, remainder `final_payment_days_before` days before the tour.
    #[serde(rename_all = "camelCase")]
    Percentage {
        amount_percent: Percent,
        final_payment_days_before: u32,
    },
}

impl Default for DepositPolicy {
    fn default() -> Self {
        DepositPolicy::Percentage {
            amount_percent: Percent::from_whole(30),
            final_payment_days_before: 14,
        }
    }
}

impl DepositPolicy {
    /// Checks the deposit percent lies within 10-50% and the final payment
    /// falls at most a year before the tour.
    ///
    /// Out-of-range values are reported, never clamped.
    pub fn validate(&self) -> ConfigResult<()> {
        if let DepositPolicy::Percentage {
            amount_percent,
            final_payment_days_before,
        } = self
        {
            if *final_payment_days_before > MAX_FINAL_PAYMENT_DAYS_BEFORE {
                return Err(ConfigurationError::FinalPaymentDaysOutOfRange {
                    days: *final_payment_days_before,
                    max: MAX_FINAL_PAYMENT_DAYS_BEFORE,
                });
            }

            let min = Percent::from_whole(DEPOSIT_MIN_PERCENT);
            let max = Percent::from_whole(DEPOSIT_MAX_PERCENT);
            if *amount_percent < min || *amount_percent > max {
                return Err(ConfigurationError::DepositPercentOutOfRange {
                    bps: amount_percent.bps(),
                    min: DEPOSIT_MIN_PERCENT,
                    max: DEPOSIT_MAX_PERCENT,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Cancellation Policy
// =============================================================================

/// Cancelling `days_or_more_before` days ahead refunds `refund_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CancellationTier {
    pub days_or_more_before: i64,
    pub refund_percent: Percent,
}

impl CancellationTier {
    pub const fn new(days_or_more_before: i64, refund_whole: u32) -> Self {
        CancellationTier {
            days_or_more_before,
            refund_percent: Percent::from_whole(refund_whole),
        }
    }
}

impl Tier for CancellationTier {
    fn threshold(&self) -> i64 {
        self.days_or_more_before
    }

    fn matches(&self, value: i64) -> bool {
        value >= self.days_or_more_before
    }

    fn percent(&self) -> Percent {
        self.refund_percent
    }
}

/// Named single-policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SinglePolicyType {
    /// Full refund up to 24 hours before.
    Flexible,
    /// Full refund 5+ days, half refund 2+ days.
    Moderate,
    /// Full refund 30+ days, half refund 14+ days.
    Strict,
    /// Guide supplies the table.
    Custom,
}

impl SinglePolicyType {
    /// Refund table used when the guide picked a preset without custom tiers.
    pub fn default_tiers(&self) -> Vec<CancellationTier> {
        match self {
            SinglePolicyType::Flexible => {
                vec![CancellationTier::new(1, 100), CancellationTier::new(0, 0)]
            }
            SinglePolicyType::Moderate => vec![
                CancellationTier::new(5, 100),
                CancellationTier::new(2, 50),
                CancellationTier::new(0, 0),
            ],
            SinglePolicyType::Strict => vec![
                CancellationTier::new(30, 100),
                CancellationTier::new(14, 50),
                CancellationTier::new(0, 0),
            ],
            SinglePolicyType::Custom => Vec::new(),
        }
    }
}

/// Which refund schedule a guide offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "approach", rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// One refund table for every booking.
    #[serde(rename_all = "camelCase")]
    Single {
        single_policy_type: SinglePolicyType,
        #[serde(default)]
        tiers: Vec<CancellationTier>,
    },
    /// Buyer picks Ultra-Flexible / Standard / Non-Refundable at checkout.
    CustomerChoice,
}

impl CancellationPolicy {
    /// Builds a single policy from a preset table.
    pub fn preset(policy_type: SinglePolicyType) -> Self {
        CancellationPolicy::Single {
            single_policy_type: policy_type,
            tiers: policy_type.default_tiers(),
        }
    }

    /// Refund table for a single policy: custom tiers when given,
    /// otherwise the preset for its type.
    pub fn single_tiers(&self) -> Option<Vec<CancellationTier>> {
        match self {
            CancellationPolicy::Single {
                single_policy_type,
                tiers,
            } => {
                if tiers.is_empty() {
                    Some(single_policy_type.default_tiers())
                } else {
                    Some(tiers.clone())
                }
            }
            CancellationPolicy::CustomerChoice => None,
        }
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        CancellationPolicy::preset(SinglePolicyType::Moderate)
    }
}

// =============================================================================
// Policy Settings
// =============================================================================

/// Everything the engine reads about a guide, as one immutable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PolicySettings {
    #[serde(default)]
    pub early_bird: EarlyBirdSettings,
    #[serde(default)]
    pub group_discount: GroupDiscountSettings,
    #[serde(default)]
    pub last_minute: LastMinuteSettings,
    #[serde(default)]
    pub deposit: DepositPolicy,
    #[serde(default)]
    pub cancellation: CancellationPolicy,
}

impl Default for PolicySettings {
    /// The documented preview default: conventional early-bird and group
    /// tables, last-minute off, 30% deposit due 14 days out.
    fn default() -> Self {
        PolicySettings {
            early_bird: EarlyBirdSettings::conventional(),
            group_discount: GroupDiscountSettings::conventional(),
            last_minute: LastMinuteSettings::default(),
            deposit: DepositPolicy::default(),
            cancellation: CancellationPolicy::default(),
        }
    }
}

impl PolicySettings {
    /// Parses a settings record and validates it.
    ///
    /// ## Example
    /// ```rust
    /// use tourbook_core::settings::{DepositPolicy, PolicySettings};
    ///
    /// let json = r#"{
    ///     "earlyBird": { "enabled": true, "tiers": [{ "daysOrMore": 30, "percent": 7 }] },
    ///     "groupDiscount": { "enabled": false },
    ///     "lastMinute": { "enabled": false, "hoursOrLess": 24, "percent": 10 },
    ///     "deposit": { "type": "none" },
    ///     "cancellation": { "approach": "customer_choice" }
    /// }"#;
    /// let settings = PolicySettings::from_json(json).unwrap();
    /// assert_eq!(settings.deposit, DepositPolicy::None);
    /// ```
    pub fn from_json(json: &str) -> PricingResult<Self> {
        let settings: PolicySettings = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every table against the settings invariants.
    ///
    /// ## Rules
    /// - Percents within 0-100%
    /// - No duplicate thresholds inside a table
    /// - Early-bird and refund percents never drop as the threshold grows
    /// - Group ranges start at 1+, are not inverted and do not overlap
    /// - Deposit percent within 10-50%
    pub fn validate(&self) -> ConfigResult<()> {
        validate_early_bird(&self.early_bird)?;
        validate_group(&self.group_discount)?;
        validate_last_minute(&self.last_minute)?;
        self.deposit.validate()?;
        validate_cancellation(&self.cancellation)?;
        Ok(())
    }
}

// =============================================================================
// Table Validators
// =============================================================================

fn check_percent(field: &str, percent: Percent) -> ConfigResult<()> {
    if !percent.is_valid() {
        return Err(ConfigurationError::PercentOutOfRange {
            field: field.to_string(),
            bps: percent.bps(),
        });
    }
    Ok(())
}

/// Checks a `value >= threshold` table: valid percents, non-negative and
/// unique thresholds, percents non-decreasing toward larger thresholds.
fn check_ascending_table<T: Tier>(table: &str, tiers: &[T]) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for tier in tiers {
        check_percent(table, tier.percent())?;
        if tier.threshold() < 0 {
            return Err(ConfigurationError::NegativeThreshold {
                table: table.to_string(),
                value: tier.threshold(),
            });
        }
        if !seen.insert(tier.threshold()) {
            return Err(ConfigurationError::DuplicateThreshold {
                table: table.to_string(),
                threshold: tier.threshold(),
            });
        }
    }

    let mut ordered: Vec<&T> = tiers.iter().collect();
    ordered.sort_by_key(|tier| tier.threshold());
    for pair in ordered.windows(2) {
        if pair[1].percent() < pair[0].percent() {
            return Err(ConfigurationError::NonMonotonicTiers {
                table: table.to_string(),
                threshold: pair[1].threshold(),
            });
        }
    }

    Ok(())
}

fn validate_early_bird(settings: &EarlyBirdSettings) -> ConfigResult<()> {
    check_ascending_table("earlyBird", &settings.tiers)
}

fn validate_group(settings: &GroupDiscountSettings) -> ConfigResult<()> {
    for tier in &settings.tiers {
        check_percent("groupDiscount", tier.percent)?;
        let inverted = tier.max_count.map_or(false, |max| max < tier.min_count);
        if tier.min_count < 1 || inverted {
            return Err(ConfigurationError::InvalidGroupRange {
                min_count: tier.min_count,
                max_count: tier.max_count,
            });
        }
    }

    let mut ordered: Vec<&GroupTier> = settings.tiers.iter().collect();
    ordered.sort_by_key(|tier| tier.min_count);
    for pair in ordered.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let overlaps = lower.max_count.map_or(true, |max| max >= upper.min_count);
        if overlaps {
            return Err(ConfigurationError::OverlappingGroupTiers {
                count: upper.min_count,
            });
        }
    }

    Ok(())
}

fn validate_last_minute(settings: &LastMinuteSettings) -> ConfigResult<()> {
    check_percent("lastMinute", settings.percent)?;
    if settings.hours_or_less < 0 {
        return Err(ConfigurationError::NegativeThreshold {
            table: "lastMinute".to_string(),
            value: settings.hours_or_less,
        });
    }
    Ok(())
}

fn validate_cancellation(policy: &CancellationPolicy) -> ConfigResult<()> {
    if let Some(tiers) = policy.single_tiers() {
        if tiers.is_empty() {
            return Err(ConfigurationError::EmptyTiers {
                table: "cancellation".to_string(),
            });
        }
        check_ascending_table("cancellation", &tiers)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
