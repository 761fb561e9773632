//! # Deposit Scheduling
//!
//! Splits a final price into the amount charged at booking and the
//! remainder due before departure.
//!
//! ```text
//!  booked_at                     due = tour_start − N days        tour_start
//!      │                                   │                           │
//!      ▼                                   ▼                           ▼
//!   deposit = round(final × pct)     final_payment = final − deposit
//! ```
//!
//! The remainder is computed by subtraction, so the two amounts always add
//! up to the final price exactly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ConfigResult, ConfigurationError};
use crate::money::Money;
use crate::settings::DepositPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DepositSchedule {
    pub deposit_amount: Money,
    pub final_payment_amount: Money,
    #[ts(as = "String")]
    pub final_payment_due: DateTime<Utc>,
}

impl DepositSchedule {
    /// Everything charged at booking time.
    fn paid_in_full(final_price: Money, booked_at: DateTime<Utc>) -> Self {
        DepositSchedule {
            deposit_amount: final_price,
            final_payment_amount: Money::zero(),
            final_payment_due: booked_at,
        }
    }

    /// Whether a second charge is scheduled at all.
    pub fn has_final_payment(&self) -> bool {
        self.final_payment_amount.is_positive()
    }
}

/// Builds the payment schedule for `final_price`.
///
/// ## Rules
/// - `none`: full charge at `booked_at`
/// - `percentage`: deposit rounded half-even, remainder by subtraction,
///   due `final_payment_days_before` days before `tour_start`
/// - a due date that is not after `booked_at` collapses to a full charge
/// - a percent outside 10-50% is an error, never clamped
///
/// ## Example
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use tourbook_core::deposit::schedule;
/// use tourbook_core::money::Money;
/// use tourbook_core::settings::DepositPolicy;
///
/// let booked_at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
/// let tour_start = booked_at + Duration::days(45);
/// let plan = schedule(Money::from_major_minor(830, 0), &DepositPolicy::default(), tour_start, booked_at).unwrap();
///
/// assert_eq!(plan.deposit_amount, Money::from_major_minor(249, 0));
/// assert_eq!(plan.final_payment_amount, Money::from_major_minor(581, 0));
/// assert_eq!(plan.final_payment_due, tour_start - Duration::days(14));
/// ```
pub fn schedule(
    final_price: Money,
    policy: &DepositPolicy,
    tour_start: DateTime<Utc>,
    booked_at: DateTime<Utc>,
) -> ConfigResult<DepositSchedule> {
    if final_price.is_negative() {
        return Err(ConfigurationError::NegativeAmount {
            field: "finalPrice".to_string(),
            cents: final_price.cents(),
        });
    }

    policy.validate()?;

    let (amount_percent, days_before) = match policy {
        DepositPolicy::None => return Ok(DepositSchedule::paid_in_full(final_price, booked_at)),
        DepositPolicy::Percentage {
            amount_percent,
            final_payment_days_before,
        } => (*amount_percent, *final_payment_days_before),
    };

    let due = tour_start
        .checked_sub_signed(Duration::days(days_before as i64))
        .ok_or_else(|| ConfigurationError::DateOutOfRange {
            field: "finalPaymentDue".to_string(),
        })?;
    if due <= booked_at {
        return Ok(DepositSchedule::paid_in_full(final_price, booked_at));
    }

    let deposit_amount = final_price.percent_of(amount_percent);
    let final_payment_amount = final_price - deposit_amount;
    if final_payment_amount.is_negative() {
        return Err(ConfigurationError::NegativeAmount {
            field: "finalPaymentAmount".to_string(),
            cents: final_payment_amount.cents(),
        });
    }

    Ok(DepositSchedule {
        deposit_amount,
        final_payment_amount,
        final_payment_due: due,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
