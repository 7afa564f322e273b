//! Type-safe monetary amounts using decimal arithmetic.
//!
//! Prices and order totals are always positive and are kept exactly as
//! submitted, with no rounding. On the wire they are plain JSON numbers.
//! Product forms submit prices as strings (multipart fields are text), so the
//! default deserializer accepts either; order totals must be real JSON
//! numbers, see [`Price::deserialize_number`].

use core::fmt;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Zero or negative amount.
    #[error("amount must be greater than zero")]
    NotPositive,
    /// Text that is not a decimal number.
    #[error("amount is not a valid number: {0}")]
    Invalid(String),
}

/// A positive amount in the store currency.
///
/// The decimal is kept verbatim: `19.999` stays `19.999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type), sqlx(transparent))]
pub struct Price(Decimal);

impl Price {
    /// Create a price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotPositive` if the amount is not above zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Deserialize a price that must be a JSON number (strings are rejected).
    ///
    /// Use with `#[serde(deserialize_with = "Price::deserialize_number")]`.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error for non-numeric input, a number out of
    /// decimal range, or a non-positive amount.
    pub fn deserialize_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumberVisitor)
    }
}

/// Accepts JSON numbers only.
struct NumberVisitor;

impl Visitor<'_> for NumberVisitor {
    type Value = Price;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a positive number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Price::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        // Shortest round-trip text, so 19.999 parses as 19.999 and not its binary expansion.
        let amount = v
            .to_string()
            .parse::<Decimal>()
            .map_err(|_| E::custom(PriceError::Invalid(v.to_string())))?;
        Price::new(amount).map_err(E::custom)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}
