use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use std::ops::{Add, Sub};

/// A two-decimal amount. Receipt prices arrive as floats; summing them as
/// `Money` keeps totals free of binary rounding noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::from(cents) / Decimal::from(100))
    }

    /// Rounds a parsed price to cents. Non-finite input becomes zero.
    pub fn from_price(price: f64) -> Self {
        Decimal::from_f64(price)
            .map(|d| Money(d.round_dp(2)))
            .unwrap_or_else(Money::zero)
    }

    /// Parses a printed amount such as `48.60`, `$1,234.56` or `(5.00)`.
    /// Parenthesized amounts are negative.
    pub fn parse_amount(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (raw, negative) = match raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            Some(inner) => (inner, true),
            None => (raw, false),
        };
        let cleaned: String = raw
            .trim_start_matches('$')
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        let value = Decimal::from_str(&cleaned).ok()?.round_dp(2);
        Some(Money(if negative { -value } else { value }))
    }

    /// Saturates at the `i64` bounds.
    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::from(100)).round().to_i64().unwrap_or(if self.0.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        })
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}
