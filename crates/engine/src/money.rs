use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer kopiikas** (1/100 UAH).
///
/// Use this type for **all** monetary values (unit prices, payment amounts,
/// balance rollups) to avoid floating-point drift. Divisibility checks (e.g.
/// "is this amount a whole number of sessions?") are exact integer
/// arithmetic on the minor units.
///
/// The value is signed:
/// - positive = credit / income
/// - negative = debt / shortfall
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.kopiikas(), 1234);
/// assert_eq!(amount.to_string(), "12.34 грн");
/// assert_eq!(Money::from_major(300).to_string(), "300 грн");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more than 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().kopiikas(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().kopiikas(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer kopiikas.
    #[must_use]
    pub const fn new(kopiikas: i64) -> Self {
        Self(kopiikas)
    }

    /// Creates a new amount from whole hryvnias.
    #[must_use]
    pub const fn from_major(hryvnias: i64) -> Self {
        Self(hryvnias * 100)
    }

    /// Returns the raw value in kopiikas.
    #[must_use]
    pub const fn kopiikas(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Multiplies by a session count (saturating on overflow).
    #[must_use]
    pub fn times(self, count: i64) -> Money {
        Money(self.0.saturating_mul(count))
    }

    /// Fractional value in hryvnias. Only for display of non-exact ratios;
    /// never feed the result back into stored amounts.
    #[must_use]
    pub fn to_major_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    /// Formats as hryvnias, omitting the fraction when it is zero
    /// (`300 грн`, `12.34 грн`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let hryvnias = abs / 100;
        let kopiikas = abs % 100;
        if kopiikas == 0 {
            write!(f, "{sign}{hryvnias} грн")
        } else {
            write!(f, "{sign}{hryvnias}.{kopiikas:02} грн")
        }
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into kopiikas.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`. Rejects empty strings and more than 2 fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty amount".to_string());
        let invalid = || EngineError::Validation("invalid amount".to_string());
        let overflow = || EngineError::Validation("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let hryvnias_str = parts.next().ok_or_else(invalid)?;
        let kopiikas_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if hryvnias_str.is_empty() || !hryvnias_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let hryvnias: i64 = hryvnias_str.parse().map_err(|_| invalid())?;

        let kopiikas: i64 = match kopiikas_str {
            None => 0,
            Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(EngineError::Validation("too many decimals".to_string()));
                    }
                }
            }
        };

        let total = hryvnias
            .checked_mul(100)
            .and_then(|v| v.checked_add(kopiikas))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_uah() {
        assert_eq!(Money::new(0).to_string(), "0 грн");
        assert_eq!(Money::new(1).to_string(), "0.01 грн");
        assert_eq!(Money::new(1050).to_string(), "10.50 грн");
        assert_eq!(Money::new(30_000).to_string(), "300 грн");
        assert_eq!(Money::new(-1050).to_string(), "-10.50 грн");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().kopiikas(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().kopiikas(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().kopiikas(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().kopiikas(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().kopiikas(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().kopiikas(), 230);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("0.001".parse::<Money>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }

    #[test]
    fn times_scales_unit_price() {
        assert_eq!(Money::from_major(300).times(5), Money::from_major(1500));
    }
}
