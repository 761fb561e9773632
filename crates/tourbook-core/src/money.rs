//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 30% deposit of $833.33 = $249.999 → which cent?                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + one explicit rounding                   │
//! │    83333 cents × 3000 bps / 10000 = 24999.9 → 25000 cents              │
//! │    Ratios are kept exact in i128 until the final rounding step         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tourbook_core::money::Money;
//! use tourbook_core::percent::Percent;
//!
//! let price = Money::from_major_minor(250, 0); // $250.00
//! let subtotal = price + price + price + price; // $1000.00
//! let discount = subtotal.percent_of(Percent::from_whole(17));
//! assert_eq!(discount.cents(), 17000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::percent::{Percent, BPS_PER_WHOLE};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results may dip below zero; the engine
///   turns any negative price into a `ConfigurationError`
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Serialized as cents**: JSON carries `83000`, never `830.0`
///
/// ## Where Money Is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  base_price_per_person ──► subtotal ──► discounts ──► final_price       │
/// │                                                         │               │
/// │                                   deposit_amount ◄──────┤               │
/// │                              final_payment_amount ◄─────┘               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tourbook_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use tourbook_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -$5.50
    /// assert_eq!(negative.cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a head count (price per person × participants).
    ///
    /// Returns `None` if the product does not fit in `i64` cents.
    #[inline]
    pub const fn checked_mul_count(&self, count: u32) -> Option<Self> {
        match self.0.checked_mul(count as i64) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Returns `percent` of this amount, rounded half-to-even to the cent.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  BANKERS ROUNDING (Round Half to Even)                              │
    /// │                                                                     │
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use tourbook_core::money::Money;
    /// use tourbook_core::percent::Percent;
    ///
    /// // 5% of $0.50 = 2.5 cents → 2 cents (even)
    /// assert_eq!(Money::from_cents(50).percent_of(Percent::from_whole(5)).cents(), 2);
    /// // 5% of $0.70 = 3.5 cents → 4 cents (even)
    /// assert_eq!(Money::from_cents(70).percent_of(Percent::from_whole(5)).cents(), 4);
    /// ```
    pub fn percent_of(&self, percent: Percent) -> Money {
        self.scaled(percent.bps() as i128, 100 * BPS_PER_WHOLE as i128)
    }

    /// Returns `percent` of this amount, rounded down to the cent.
    ///
    /// Used as a ceiling: a capped discount never exceeds the exact cap.
    pub fn percent_of_floor(&self, percent: Percent) -> Money {
        let exact = self.0 as i128 * percent.bps() as i128;
        let cents = exact.div_euclid(100 * BPS_PER_WHOLE as i128);
        Money::from_cents(cents as i64)
    }

    /// Returns `self × numerator / denominator`, rounded half-to-even once.
    ///
    /// Used for proportional allocation where the ratio must stay exact
    /// until the final cent (e.g. `subtotal × share × cap / (raw × 100)`).
    pub fn scaled(&self, numerator: i128, denominator: i128) -> Money {
        let value = div_round_half_even(self.0 as i128 * numerator, denominator);
        Money::from_cents(value as i64)
    }

    /// Like [`Money::scaled`], but `None` when the result leaves `i64` cents.
    ///
    /// Required whenever `numerator > denominator`.
    pub fn checked_scaled(&self, numerator: i128, denominator: i128) -> Option<Money> {
        let product = (self.0 as i128).checked_mul(numerator)?;
        let value = div_round_half_even(product, denominator);
        i64::try_from(value).ok().map(Money::from_cents)
    }
}

/// Integer division with round-half-to-even.
///
/// `denominator` must be non-zero. Works for negative numerators.
pub fn div_round_half_even(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator != 0);

    let (numerator, denominator) = if denominator < 0 {
        (-numerator, -denominator)
    } else {
        (numerator, denominator)
    };

    let quotient = numerator.div_euclid(denominator);
    let remainder = numerator.rem_euclid(denominator);
    let twice = remainder * 2;

    if twice > denominator || (twice == denominator && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. UIs format with their own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
