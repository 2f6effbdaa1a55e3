//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are positive amounts with at most two fractional digits. They are
//! stored as `NUMERIC(12,2)` and never pass through floating point.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The amount is zero or negative.
    #[error("price must be greater than zero")]
    NotPositive,
    /// The amount has more than two fractional digits.
    #[error("price must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum number of fractional digits.
        max: u32,
    },
    /// The amount does not fit the storage column.
    #[error("price must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A unit price.
///
/// ## Examples
///
/// ```
/// use stockroom_core::Price;
///
/// let price = Price::parse("10.50").unwrap();
/// assert_eq!(price.to_string(), "10.50");
/// assert_eq!(price.line_total(2).to_string(), "21.00");
///
/// assert!(Price::parse("0").is_err());
/// assert!(Price::parse("1.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Maximum number of fractional digits.
    pub const SCALE: u32 = 2;

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not positive, has more than two
    /// fractional digits, or exceeds `NUMERIC(12,2)`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }

        let normalized = amount.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(PriceError::TooPrecise { max: Self::SCALE });
        }

        let max = Self::max();
        if amount >= max {
            return Err(PriceError::TooLarge { max });
        }

        let mut amount = amount;
        amount.rescale(Self::SCALE);
        Ok(Self(amount))
    }

    /// Create a price from an amount in cents.
    ///
    /// # Errors
    ///
    /// Returns an error if `cents` is not positive or too large.
    pub fn from_cents(cents: i64) -> Result<Self, PriceError> {
        Self::new(Decimal::new(cents, Self::SCALE))
    }

    /// Parse a price from user input such as `"10"`, `"10.5"` or `"10.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a number, or not a valid
    /// price.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(s).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }

    /// The amount in currency units.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    #[must_use]
    pub fn line_total(&self, quantity: i32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }

    fn max() -> Decimal {
        // NUMERIC(12,2): ten integer digits
        Decimal::new(10_000_000_000, 0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("10").unwrap().to_string(), "10.00");
        assert_eq!(Price::parse("10.5").unwrap().to_string(), "10.50");
        assert_eq!(Price::parse(" 0.01 ").unwrap().to_string(), "0.01");
        assert_eq!(Price::parse("2.500").unwrap().to_string(), "2.50");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Price::parse("  "), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert_eq!(Price::parse("ten"), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-1.00"), Err(PriceError::NotPositive));
    }

    #[test]
    fn test_rejects_sub_cent_amounts() {
        assert!(matches!(
            Price::parse("1.005"),
            Err(PriceError::TooPrecise { max: 2 })
        ));
    }

    #[test]
    fn test_rejects_too_large() {
        assert!(matches!(
            Price::parse("10000000000"),
            Err(PriceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_line_total() {
        let price = Price::from_cents(1000).unwrap();
        assert_eq!(price.line_total(2), Decimal::new(2000, 2));
        assert_eq!(price.line_total(0), Decimal::ZERO);
    }

    #[test]
    fn test_serde_uses_string_amount() {
        let price = Price::parse("5").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"5.00\"");

        let parsed: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, price);
        assert!(serde_json::from_str::<Price>("\"-5\"").is_err());
    }
}
