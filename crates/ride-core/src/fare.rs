//! # Fare
//!
//! Non-negative monetary amount in minor units (cents). Floats never reach
//! storage: conversion from a decimal amount happens once, at the edge, via
//! [`Fare::from_major`].

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A non-negative fare in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fare(u64);

impl Fare {
    /// Zero fare.
    pub const ZERO: Fare = Fare(0);

    /// Create a fare from minor units.
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Create a fare from a decimal amount in major units, rounded to the
    /// nearest cent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFare`] for negative, non-finite or
    /// unrepresentably large amounts.
    pub fn from_major(amount: f64) -> Result<Self, ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidFare(format!(
                "{amount} is not a non-negative finite amount"
            )));
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return Err(ValidationError::InvalidFare(format!("{amount} is too large")));
        }
        Ok(Self(cents as u64))
    }

    /// Amount in minor units.
    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Saturating sum of two fares.
    pub fn saturating_add(self, other: Fare) -> Fare {
        Fare(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Fare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Fare::from_cents(1250).to_string(), "12.50");
        assert_eq!(Fare::from_cents(7).to_string(), "0.07");
        assert_eq!(Fare::ZERO.to_string(), "0.00");
    }

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Fare::from_major(12.345).unwrap().cents(), 1235);
        assert_eq!(Fare::from_major(0.0).unwrap(), Fare::ZERO);
    }

    #[test]
    fn from_major_rejects_negative_and_nan() {
        assert!(matches!(
            Fare::from_major(-0.01),
            Err(ValidationError::InvalidFare(_))
        ));
        assert!(Fare::from_major(f64::NAN).is_err());
        assert!(Fare::from_major(f64::INFINITY).is_err());
    }

    #[test]
    fn serializes_as_integer_cents() {
        let json = serde_json::to_string(&Fare::from_cents(999)).unwrap();
        assert_eq!(json, "999");
        assert!(serde_json::from_str::<Fare>("-1").is_err());
    }
}
