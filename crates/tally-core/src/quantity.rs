//! # Quantity Module
//!
//! Unit counts on transactions (sold, returned, gifted, purchased).
//!
//! Quantities are entered with up to two decimal places, so they are kept as
//! an integer count of hundredths, the same way [`Money`](crate::money::Money)
//! keeps cents. All tier lookups and the commission rate work on that integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Hundredths per whole unit.
const SCALE: i64 = 100;

/// A count of units with two decimal places, stored as hundredths.
///
/// ```rust
/// use tally_core::quantity::Quantity;
///
/// let q: Quantity = "12.5".parse().unwrap();
/// assert_eq!(q.hundredths(), 1250);
/// assert_eq!(q.whole_units(), 12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * SCALE)
    }

    /// Creates a quantity from hundredths of a unit.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Returns the raw hundredths count.
    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit part, rounded down.
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0.div_euclid(SCALE)
    }

    /// Zero units.
    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by `numerator / denominator` and rounds down to whole units.
    ///
    /// Used for the per-unit commission: `floor(q × 7 / 10)`.
    ///
    /// ```rust
    /// use tally_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(5500).floor_units_times(7, 10), 3850);
    /// assert_eq!(Quantity::from_hundredths(101).floor_units_times(7, 10), 0);
    /// ```
    pub fn floor_units_times(&self, numerator: i64, denominator: i64) -> i64 {
        let scaled = self.0 as i128 * numerator as i128;
        let divisor = denominator as i128 * SCALE as i128;
        scaled.div_euclid(divisor) as i64
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

/// Shows the shortest exact form: `12`, `12.5`, `12.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / SCALE;
        let frac = abs % SCALE;

        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else if frac % 10 == 0 {
            write!(f, "{}{}.{}", sign, whole, frac / 10)
        } else {
            write!(f, "{}{}.{:02}", sign, whole, frac)
        }
    }
}

/// Parses `"12"`, `"12.5"` or `"12.25"`. More than two decimals is rejected
/// rather than silently rounded.
impl FromStr for Quantity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "quantity".to_string(),
            });
        }

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if frac.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("not a number"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a number"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("too large"))?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("not a number"))? * 10,
            _ => frac.parse().map_err(|_| invalid("not a number"))?,
        };

        let value = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(|| invalid("too large"))?;

        Ok(Quantity(if negative { -value } else { value }))
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}
