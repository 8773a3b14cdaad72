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
//! │    5500 × 0.7 = 3849.9999999999995  → floor() = 3849  ❌ WRONG!         │
//! │                                                                         │
//! │  Summing thousands of sale totals drifts by fractions of a cent, and   │
//! │  the bonus pool is a running sum over ALL history.                     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of cents (1/100 yuan).                 │
//! │    Percentages are applied with explicit, documented rounding.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_major_minor(12, 50); // ¥12.50
//! let total = price * 4;                       // ¥50.00
//! assert_eq!(total, Money::from_yuan(50));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (1/100 of a yuan).
///
/// ## Design Decisions
/// - **i64 (signed)**: net profit, net collections and balances go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Transparent in SQL**: stored as an INTEGER `*_cents` column
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Transaction.total_amount ──┬──► net collections ──► EmployeeBalance   │
/// │                             │                                           │
/// │                             └──► sales / returns ──► net profit        │
/// │                                                        │                │
/// │                                         × 1% ──► monthly bonus pool     │
/// │                                                                         │
/// │  Salary (base + commission + bonus) ──────────────────► net profit     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ¥10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole yuan.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_yuan(3000).cents(), 300_000);
    /// ```
    #[inline]
    pub const fn from_yuan(yuan: i64) -> Self {
        Money(yuan * 100)
    }

    /// Creates a Money value from major and minor units (yuan and cents).
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -¥5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-yuan portion (truncated toward zero).
    #[inline]
    pub const fn yuan(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a rate in basis points, rounding half away from zero.
    ///
    /// ## Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  1% of net profit (100 bps)                                         │
    /// │                                                                     │
    /// │   ¥40000.00 →  ¥400.00        exact                                 │
    /// │   ¥123.45   →  ¥1.2345 → ¥1.23                                      │
    /// │   ¥123.50   →  ¥1.235  → ¥1.24   (half away from zero)              │
    /// │  -¥123.50   → -¥1.235  → -¥1.24  (symmetric for losses)             │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let net_profit = Money::from_yuan(40_000);
    /// assert_eq!(net_profit.apply_bps(100), Money::from_yuan(400));
    /// ```
    pub fn apply_bps(&self, bps: u32) -> Money {
        // i128 keeps the intermediate product safe for very large sums
        let scaled = self.0 as i128 * bps as i128;
        let magnitude = (scaled.abs() + 5_000) / 10_000;
        let cents = if scaled < 0 { -magnitude } else { magnitude };
        Money::from_cents(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display, e.g. `¥10.99` / `-¥5.50`.
///
/// ## Note
/// The UI formats amounts itself; this is for logs and error messages.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}¥{}.{:02}", sign, self.yuan().abs(), self.cents_part())
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.yuan(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "¥10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-¥5.50");
        assert_eq!(Money::zero().to_string(), "¥0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_yuan(10);
        let b = Money::from_yuan(5);

        assert_eq!(a + b, Money::from_yuan(15));
        assert_eq!(a - b, Money::from_yuan(5));
        assert_eq!(b - a, Money::from_yuan(-5));
        assert_eq!(-a, Money::from_yuan(-10));
        assert_eq!(a * 3, Money::from_yuan(30));
    }

    #[test]
    fn test_sum() {
        let amounts = vec![Money::from_cents(150), Money::from_cents(250), Money::from_cents(-100)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.cents(), 300);

        let empty: Vec<Money> = Vec::new();
        assert!(empty.into_iter().sum::<Money>().is_zero());
    }

    #[test]
    fn test_apply_bps_rounding() {
        assert_eq!(Money::from_yuan(40_000).apply_bps(100), Money::from_yuan(400));
        assert_eq!(Money::from_cents(12_345).apply_bps(100).cents(), 123);
        assert_eq!(Money::from_cents(12_350).apply_bps(100).cents(), 124);
        assert_eq!(Money::from_cents(-12_350).apply_bps(100).cents(), -124);
        assert_eq!(Money::from_cents(-12_345).apply_bps(100).cents(), -123);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
