//! # Discount Codes
//!
//! Creation rules, redeemability and amount computation for promotional
//! codes. Everything here is pure; incrementing `times_used` is the store's
//! job and happens in one conditional update (see `tourbook-db`).
//!
//! ## Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            toggle                                                       │
//! │   Active ◄──────────► Inactive        (stored flag)                     │
//! │     │                                                                   │
//! │     ├── valid_until < now ──────────► Expired     (derived)             │
//! │     └── times_used >= max_uses ─────► Exhausted   (derived)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rejection Order
//! Scope mismatch (`NOT_FOUND`), then `INACTIVE`, `EXPIRED`, `EXHAUSTED`,
//! not-yet-valid (`INACTIVE`) and finally `BELOW_MINIMUM`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{RedemptionRejected, RejectionReason, ValidationError};
use crate::money::Money;
use crate::percent::Percent;
use crate::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};

/// Result type for code creation checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Discount Type / Value
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

/// What a code takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "discountType", content = "value", rename_all = "lowercase")]
pub enum DiscountValue {
    /// Percent of the post-cap price.
    Percentage(Percent),
    /// Flat amount, never more than the purchase.
    Fixed(Money),
}

impl DiscountValue {
    pub const fn discount_type(&self) -> DiscountType {
        match self {
            DiscountValue::Percentage(_) => DiscountType::Percentage,
            DiscountValue::Fixed(_) => DiscountType::Fixed,
        }
    }

    /// Raw stored value: basis points or cents.
    pub fn raw_value(&self) -> i64 {
        match self {
            DiscountValue::Percentage(p) => p.bps() as i64,
            DiscountValue::Fixed(m) => m.cents(),
        }
    }

    /// Rebuilds a value from its stored discriminant and raw number.
    pub fn from_raw(discount_type: DiscountType, raw: i64) -> Option<Self> {
        match discount_type {
            DiscountType::Percentage => u32::try_from(raw)
                .ok()
                .map(|bps| DiscountValue::Percentage(Percent::from_bps(bps))),
            DiscountType::Fixed => Some(DiscountValue::Fixed(Money::from_cents(raw))),
        }
    }

    /// Amount taken off `purchase`.
    ///
    /// ```rust
    /// use tourbook_core::code::DiscountValue;
    /// use tourbook_core::money::Money;
    ///
    /// let fixed = DiscountValue::Fixed(Money::from_major_minor(50, 0));
    /// assert_eq!(fixed.amount_off(Money::from_major_minor(20, 0)), Money::from_major_minor(20, 0));
    /// ```
    pub fn amount_off(&self, purchase: Money) -> Money {
        match self {
            DiscountValue::Percentage(percent) => purchase.percent_of(*percent),
            DiscountValue::Fixed(amount) => (*amount).min(purchase),
        }
    }
}

// =============================================================================
// Scope
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CodeScope {
    /// Issued by the platform, valid on every guide's tours.
    Platform,
    /// Issued by one guide, valid on that guide's tours only.
    Guide,
}

// =============================================================================
// Discount Code
// =============================================================================

/// A stored promotional code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    #[ts(as = "String")]
    pub id: Uuid,

    /// Uppercase, unique.
    pub code: String,

    #[serde(flatten)]
    #[ts(flatten)]
    pub value: DiscountValue,

    pub scope: CodeScope,

    /// Owner when `scope` is `guide`.
    #[ts(as = "Option<String>")]
    pub guide_id: Option<Uuid>,

    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,

    pub max_uses: Option<i64>,

    /// Successful redemptions so far. Never exceeds `max_uses`.
    pub times_used: i64,

    pub min_purchase_amount: Option<Money>,

    pub active: bool,
}

/// Derived lifecycle state of a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Active,
    Inactive,
    Expired,
    Exhausted,
}

impl DiscountCode {
    /// Status as shown to admins at `now`.
    pub fn status(&self, now: DateTime<Utc>) -> CodeStatus {
        if !self.active || self.not_yet_valid(now) {
            CodeStatus::Inactive
        } else if self.is_expired(now) {
            CodeStatus::Expired
        } else if self.is_exhausted() {
            CodeStatus::Exhausted
        } else {
            CodeStatus::Active
        }
    }

    /// Window checks run at millisecond precision, the resolution codes are
    /// stored at.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until
            .map_or(false, |until| until.timestamp_millis() < now.timestamp_millis())
    }

    fn not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() < self.valid_from.timestamp_millis()
    }

    pub fn is_exhausted(&self) -> bool {
        uses_exhausted(self.max_uses, self.times_used)
    }

    /// Whether a guide-scoped code belongs to `guide_id`. Platform codes
    /// apply everywhere.
    pub fn applies_to(&self, guide_id: Option<Uuid>) -> bool {
        match self.scope {
            CodeScope::Platform => true,
            CodeScope::Guide => self.guide_id.is_some() && self.guide_id == guide_id,
        }
    }

    /// Checks the code could be redeemed now on `purchase`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use tourbook_core::code::{CodeScope, DiscountCode, DiscountValue};
    /// use tourbook_core::error::RejectionReason;
    /// use tourbook_core::money::Money;
    /// use tourbook_core::percent::Percent;
    ///
    /// let now = Utc::now();
    /// let code = DiscountCode {
    ///     id: uuid::Uuid::new_v4(),
    ///     code: "SUMMER10".to_string(),
    ///     value: DiscountValue::Percentage(Percent::from_whole(10)),
    ///     scope: CodeScope::Platform,
    ///     guide_id: None,
    ///     valid_from: now - Duration::days(1),
    ///     valid_until: None,
    ///     max_uses: Some(1),
    ///     times_used: 1,
    ///     min_purchase_amount: None,
    ///     active: true,
    /// };
    /// let err = code.check_redeemable(now, Money::from_major_minor(100, 0), None).unwrap_err();
    /// assert_eq!(err.reason, RejectionReason::Exhausted);
    /// ```
    pub fn check_redeemable(
        &self,
        now: DateTime<Utc>,
        purchase: Money,
        guide_id: Option<Uuid>,
    ) -> Result<(), RedemptionRejected> {
        match self.rejection(now, purchase, guide_id, self.times_used) {
            Some(reason) => Err(RedemptionRejected::new(&self.code, reason)),
            None => Ok(()),
        }
    }

    /// Discount this code grants on `purchase`, without any checks.
    pub fn discount_amount(&self, purchase: Money) -> Money {
        self.value.amount_off(purchase)
    }

    /// Validates and prices a redemption in one step.
    pub fn redeem_amount(
        &self,
        now: DateTime<Utc>,
        purchase: Money,
        guide_id: Option<Uuid>,
    ) -> Result<Money, RedemptionRejected> {
        self.check_redeemable(now, purchase, guide_id)?;
        Ok(self.discount_amount(purchase))
    }

    /// First failing rule for a code that had `uses_before` redemptions
    /// before this attempt.
    fn rejection(
        &self,
        now: DateTime<Utc>,
        purchase: Money,
        guide_id: Option<Uuid>,
        uses_before: i64,
    ) -> Option<RejectionReason> {
        if !self.applies_to(guide_id) {
            return Some(RejectionReason::NotFound);
        }
        if !self.active {
            return Some(RejectionReason::Inactive);
        }
        if self.is_expired(now) {
            return Some(RejectionReason::Expired);
        }
        if uses_exhausted(self.max_uses, uses_before) {
            return Some(RejectionReason::Exhausted);
        }
        if self.not_yet_valid(now) {
            return Some(RejectionReason::Inactive);
        }
        let minimum = self.min_purchase_amount.unwrap_or_default();
        if purchase < minimum {
            return Some(RejectionReason::BelowMinimum);
        }
        None
    }
}

fn uses_exhausted(max_uses: Option<i64>, times_used: i64) -> bool {
    max_uses.map_or(false, |max| times_used >= max)
}

// =============================================================================
// Redemption
// =============================================================================

/// A redemption the store has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RedeemOutcome {
    #[ts(as = "String")]
    pub code_id: Uuid,
    pub code: String,
    pub discount_amount: Money,
    /// Counter value after this redemption.
    pub times_used: i64,
}

/// Re-checks a code using the row returned by the store's atomic increment.
///
/// `updated` already includes this redemption in `times_used`, so the usage
/// cap is checked against the count before it.
pub fn confirm_redemption(
    updated: &DiscountCode,
    now: DateTime<Utc>,
    purchase: Money,
    guide_id: Option<Uuid>,
) -> Result<RedeemOutcome, RedemptionRejected> {
    if updated.max_uses.map_or(false, |max| updated.times_used > max) {
        return Err(RedemptionRejected::new(
            &updated.code,
            RejectionReason::Exhausted,
        ));
    }
    if let Some(reason) = updated.rejection(now, purchase, guide_id, updated.times_used - 1) {
        return Err(RedemptionRejected::new(&updated.code, reason));
    }

    Ok(RedeemOutcome {
        code_id: updated.id,
        code: updated.code.clone(),
        discount_amount: updated.discount_amount(purchase),
        times_used: updated.times_used,
    })
}

// =============================================================================
// Creation
// =============================================================================

/// Input for creating a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscountCode {
    pub code: String,
    #[serde(flatten)]
    #[ts(flatten)]
    pub value: DiscountValue,
    pub scope: CodeScope,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub guide_id: Option<Uuid>,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub min_purchase_amount: Option<Money>,
}

impl NewDiscountCode {
    /// Validates the input and returns the stored form: normalized code,
    /// fresh id, zero uses, active.
    pub fn into_code(self) -> ValidationResult<DiscountCode> {
        let code = validate_code(&self.code)?;
        validate_value(&self.value)?;

        match (self.scope, self.guide_id) {
            (CodeScope::Guide, None) => {
                return Err(ValidationError::Required {
                    field: "guideId".to_string(),
                })
            }
            (CodeScope::Platform, Some(_)) => {
                return Err(ValidationError::InvalidFormat {
                    field: "guideId".to_string(),
                    reason: "platform codes are not owned by a guide".to_string(),
                })
            }
            _ => {}
        }

        if let Some(until) = self.valid_until {
            if until <= self.valid_from {
                return Err(ValidationError::InvalidFormat {
                    field: "validUntil".to_string(),
                    reason: "must be after validFrom".to_string(),
                });
            }
        }

        if let Some(max) = self.max_uses {
            if max < 1 {
                return Err(ValidationError::MustBePositive {
                    field: "maxUses".to_string(),
                });
            }
        }

        if let Some(min) = self.min_purchase_amount {
            if min.is_negative() {
                return Err(ValidationError::OutOfRange {
                    field: "minPurchaseAmount".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }

        Ok(DiscountCode {
            id: Uuid::new_v4(),
            code,
            value: self.value,
            scope: self.scope,
            guide_id: self.guide_id,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            max_uses: self.max_uses,
            times_used: 0,
            min_purchase_amount: self.min_purchase_amount,
            active: true,
        })
    }
}

/// Trims and uppercases a code. Lookups and uniqueness use this form.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validates a code and returns its normalized form.
///
/// ## Rules
/// - Not empty after trimming
/// - 3 to 32 characters
/// - Only `A-Z`, `0-9`, `-` and `_`
///
/// ## Example
/// ```rust
/// use tourbook_core::code::validate_code;
///
/// assert_eq!(validate_code(" summer-10 ").unwrap(), "SUMMER-10");
/// assert!(validate_code("no spaces").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<String> {
    let normalized = normalize_code(code);

    if normalized.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if normalized.len() < MIN_CODE_LENGTH {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: MIN_CODE_LENGTH,
        });
    }

    if normalized.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if !normalized
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(normalized)
}

/// Percentage codes take `0 < value <= 100`, fixed codes `value > 0`.
pub fn validate_value(value: &DiscountValue) -> ValidationResult<()> {
    match value {
        DiscountValue::Percentage(percent) => {
            if percent.is_zero() || !percent.is_valid() {
                return Err(ValidationError::OutOfRange {
                    field: "value".to_string(),
                    min: 0,
                    max: 100,
                });
            }
        }
        DiscountValue::Fixed(amount) => {
            if !amount.is_positive() {
                return Err(ValidationError::MustBePositive {
                    field: "value".to_string(),
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn code() -> DiscountCode {
        DiscountCode {
            id: Uuid::new_v4(),
            code: "SUMMER10".to_string(),
            value: DiscountValue::Percentage(Percent::from_whole(10)),
            scope: CodeScope::Platform,
            guide_id: None,
            valid_from: now() - Duration::days(30),
            valid_until: Some(now() + Duration::days(30)),
            max_uses: Some(100),
            times_used: 0,
            min_purchase_amount: Some(Money::from_major_minor(50, 0)),
            active: true,
        }
    }

    fn new_code(raw: &str) -> NewDiscountCode {
        NewDiscountCode {
            code: raw.to_string(),
            value: DiscountValue::Percentage(Percent::from_whole(10)),
            scope: CodeScope::Platform,
            guide_id: None,
            valid_from: now(),
            valid_until: None,
            max_uses: None,
            min_purchase_amount: None,
        }
    }

    fn reason(code: &DiscountCode, purchase: Money, guide: Option<Uuid>) -> Option<RejectionReason> {
        code.check_redeemable(now(), purchase, guide).err().map(|e| e.reason)
    }

    #[test]
    fn test_redeemable_code_passes() {
        assert_eq!(reason(&code(), Money::from_major_minor(100, 0), None), None);
        assert_eq!(code().status(now()), CodeStatus::Active);
    }

    #[test]
    fn test_each_rejection_reason() {
        let purchase = Money::from_major_minor(100, 0);

        let mut inactive = code();
        inactive.active = false;
        assert_eq!(reason(&inactive, purchase, None), Some(RejectionReason::Inactive));

        let mut expired = code();
        expired.valid_until = Some(now() - Duration::seconds(1));
        assert_eq!(reason(&expired, purchase, None), Some(RejectionReason::Expired));
        assert_eq!(expired.status(now()), CodeStatus::Expired);

        let mut exhausted = code();
        exhausted.times_used = 100;
        assert_eq!(reason(&exhausted, purchase, None), Some(RejectionReason::Exhausted));
        assert_eq!(exhausted.status(now()), CodeStatus::Exhausted);

        let mut scheduled = code();
        scheduled.valid_from = now() + Duration::days(1);
        assert_eq!(reason(&scheduled, purchase, None), Some(RejectionReason::Inactive));

        assert_eq!(
            reason(&code(), Money::from_major_minor(49, 99), None),
            Some(RejectionReason::BelowMinimum)
        );
    }

    #[test]
    fn test_rejection_order() {
        let mut code = code();
        code.active = false;
        code.valid_until = Some(now() - Duration::days(1));
        code.times_used = 100;
        assert_eq!(
            reason(&code, Money::zero(), None),
            Some(RejectionReason::Inactive)
        );

        code.active = true;
        assert_eq!(reason(&code, Money::zero(), None), Some(RejectionReason::Expired));

        code.valid_until = None;
        assert_eq!(reason(&code, Money::zero(), None), Some(RejectionReason::Exhausted));
    }

    #[test]
    fn test_guide_scope_is_not_found_elsewhere() {
        let owner = Uuid::new_v4();
        let mut code = code();
        code.scope = CodeScope::Guide;
        code.guide_id = Some(owner);

        let purchase = Money::from_major_minor(100, 0);
        assert_eq!(reason(&code, purchase, Some(owner)), None);
        assert_eq!(
            reason(&code, purchase, Some(Uuid::new_v4())),
            Some(RejectionReason::NotFound)
        );
        assert_eq!(reason(&code, purchase, None), Some(RejectionReason::NotFound));
    }

    #[test]
    fn test_amounts() {
        let percent = DiscountValue::Percentage(Percent::from_whole(10));
        assert_eq!(
            percent.amount_off(Money::from_major_minor(90, 0)),
            Money::from_major_minor(9, 0)
        );
        // 10% of $0.25 = 2.5 cents → 2
        assert_eq!(percent.amount_off(Money::from_cents(25)), Money::from_cents(2));

        let fixed = DiscountValue::Fixed(Money::from_major_minor(50, 0));
        assert_eq!(
            fixed.amount_off(Money::from_major_minor(20, 0)),
            Money::from_major_minor(20, 0)
        );
        assert_eq!(
            fixed.amount_off(Money::from_major_minor(80, 0)),
            Money::from_major_minor(50, 0)
        );
    }

    #[test]
    fn test_confirm_uses_count_before_increment() {
        let mut updated = code();
        updated.max_uses = Some(1);
        updated.times_used = 1;
        let outcome =
            confirm_redemption(&updated, now(), Money::from_major_minor(100, 0), None).unwrap();
        assert_eq!(outcome.times_used, 1);
        assert_eq!(outcome.discount_amount, Money::from_major_minor(10, 0));

        updated.times_used = 2;
        let err = confirm_redemption(&updated, now(), Money::from_major_minor(100, 0), None)
            .unwrap_err();
        assert_eq!(err.reason, RejectionReason::Exhausted);
    }

    #[test]
    fn test_creation_normalizes_and_validates() {
        let created = new_code("  summer10 ").into_code().unwrap();
        assert_eq!(created.code, "SUMMER10");
        assert_eq!(created.times_used, 0);
        assert!(created.active);

        assert!(matches!(
            new_code("ab").into_code(),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            new_code(&"A".repeat(33)).into_code(),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            new_code("SUMMER 10").into_code(),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_creation_value_rules() {
        let mut input = new_code("BIG");
        input.value = DiscountValue::Percentage(Percent::from_whole(101));
        assert!(matches!(input.into_code(), Err(ValidationError::OutOfRange { .. })));

        let mut input = new_code("ZERO");
        input.value = DiscountValue::Percentage(Percent::ZERO);
        assert!(input.into_code().is_err());

        let mut input = new_code("FLAT");
        input.value = DiscountValue::Fixed(Money::zero());
        assert!(matches!(input.into_code(), Err(ValidationError::MustBePositive { .. })));

        let mut input = new_code("FULL");
        input.value = DiscountValue::Percentage(Percent::HUNDRED);
        assert!(input.into_code().is_ok());
    }

    #[test]
    fn test_creation_scope_window_and_limits() {
        let mut input = new_code("GUIDE5");
        input.scope = CodeScope::Guide;
        assert!(matches!(input.into_code(), Err(ValidationError::Required { .. })));

        let mut input = new_code("WINDOW");
        input.valid_until = Some(now() - Duration::days(1));
        assert!(matches!(input.into_code(), Err(ValidationError::InvalidFormat { .. })));

        let mut input = new_code("LIMIT");
        input.max_uses = Some(0);
        assert!(matches!(input.into_code(), Err(ValidationError::MustBePositive { .. })));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(code()).unwrap();
        assert_eq!(json["code"], "SUMMER10");
        assert_eq!(json["discountType"], "percentage");
        assert_eq!(json["value"], 10);
        assert_eq!(json["scope"], "platform");
        assert_eq!(json["timesUsed"], 0);
        assert_eq!(json["minPurchaseAmount"], 5000);
    }

    #[test]
    fn test_raw_value_round_trip_for_storage() {
        let value = DiscountValue::Fixed(Money::from_cents(1250));
        assert_eq!(
            DiscountValue::from_raw(value.discount_type(), value.raw_value()),
            Some(value)
        );
        assert_eq!(DiscountValue::from_raw(DiscountType::Percentage, -1), None);
    }

    #[test]
    fn test_window_edges_within_same_millisecond() {
        let instant = now() + Duration::microseconds(700);
        let mut code = code();
        code.valid_until = Some(now() + Duration::microseconds(200));
        assert!(!code.is_expired(instant));
        assert_eq!(code.status(instant), CodeStatus::Active);

        code.valid_from = now() + Duration::microseconds(900);
        code.valid_until = None;
        assert_eq!(code.status(instant), CodeStatus::Active);
        assert!(code
            .check_redeemable(instant, Money::from_major_minor(100, 0), None)
            .is_ok());

        assert_eq!(code.status(now() - Duration::milliseconds(1)), CodeStatus::Inactive);
        code.valid_until = Some(now());
        assert!(code.is_expired(now() + Duration::milliseconds(1)));
    }
}
