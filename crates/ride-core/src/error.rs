//! # Validation Errors
//!
//! Structured errors raised when a domain primitive is constructed from
//! untrusted input. Each variant carries the rejected value so that the
//! API layer can echo it back to the caller.

use thiserror::Error;

/// Validation errors for domain primitive types.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Latitude outside [-90, 90] or not a finite number.
    #[error("invalid latitude: {0} (expected a finite value in [-90, 90])")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not a finite number.
    #[error("invalid longitude: {0} (expected a finite value in [-180, 180])")]
    InvalidLongitude(f64),

    /// Coordinate text is not of the form `lat,lon`.
    #[error("invalid coordinate: \"{0}\" (expected \"<latitude>,<longitude>\")")]
    InvalidCoordinate(String),

    /// Fare amount is negative, not finite, or too large to represent.
    #[error("invalid fare: {0}")]
    InvalidFare(String),

    /// Identifier string is not a valid UUID.
    #[error("invalid {kind} identifier: \"{value}\"")]
    InvalidIdentifier {
        /// Which identifier was being parsed (e.g. "ride", "driver").
        kind: &'static str,
        /// The string that failed to parse.
        value: String,
    },

    /// Role name is not one of `rider`, `driver`, `admin`.
    #[error("unknown role: \"{0}\" (expected rider, driver or admin)")]
    InvalidRole(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latitude_error_mentions_range() {
        let msg = ValidationError::InvalidLatitude(91.0).to_string();
        assert!(msg.contains("91"));
        assert!(msg.contains("[-90, 90]"));
    }

    #[test]
    fn identifier_error_mentions_kind_and_value() {
        let err = ValidationError::InvalidIdentifier {
            kind: "ride",
            value: "not-a-uuid".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ride"));
        assert!(msg.contains("not-a-uuid"));
    }

    #[test]
    fn role_error_lists_known_roles() {
        let msg = ValidationError::InvalidRole("pilot".into()).to_string();
        assert!(msg.contains("pilot"));
        assert!(msg.contains("rider, driver or admin"));
    }
}
