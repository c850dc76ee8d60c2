//! Fee amounts in minor currency units.
//!
//! Amounts are stored and computed as integer paise. Rendering to a decimal
//! string happens only at the edges.

use std::fmt;

use serde::{Serialize, Serializer};

/// Currency used for every portal fee.
pub const CURRENCY_INR: &str = "INR";

const MINOR_PER_MAJOR: i64 = 100;

/// Error raised when constructing a [`Money`] value from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// Fees cannot be negative.
    #[error("amount must not be negative (got {0} minor units)")]
    Negative(i64),
}

/// Non-negative amount of money in minor units.
///
/// # Examples
/// ```
/// use portal_backend::domain::Money;
///
/// let fee = Money::from_minor(50_000).expect("valid fee");
/// assert_eq!(fee.to_string(), "500.00");
/// assert!(!fee.is_free());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// A zero amount.
    pub const ZERO: Self = Self(0);

    /// Construct from minor units, rejecting negative values.
    pub const fn from_minor(minor: i64) -> Result<Self, MoneyError> {
        if minor < 0 {
            return Err(MoneyError::Negative(minor));
        }
        Ok(Self(minor))
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Free events carry a zero fee.
    #[must_use]
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0.div_euclid(MINOR_PER_MAJOR);
        let minor = self.0.rem_euclid(MINOR_PER_MAJOR);
        write!(f, "{major}.{minor:02}")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, "0.00")]
    #[case::paise_only(5, "0.05")]
    #[case::whole(50_000, "500.00")]
    #[case::mixed(12_345, "123.45")]
    fn renders_two_decimal_places(#[case] minor: i64, #[case] expected: &str) {
        let money = Money::from_minor(minor).expect("non-negative amount");
        assert_eq!(money.to_string(), expected);
    }

    #[rstest]
    fn rejects_negative_amounts() {
        assert_eq!(Money::from_minor(-1), Err(MoneyError::Negative(-1)));
    }

    #[rstest]
    fn serialises_as_decimal_string() {
        let money = Money::from_minor(25_050).expect("valid amount");
        let encoded = serde_json::to_string(&money).expect("serialises");
        assert_eq!(encoded, "\"250.50\"");
    }

    #[rstest]
    fn zero_is_free() {
        assert!(Money::ZERO.is_free());
        assert!(!Money::from_minor(1).expect("valid").is_free());
    }
}
