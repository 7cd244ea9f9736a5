//! # Identity Newtypes
//!
//! UUID-backed identifiers for rides and the parties involved in them.
//! Each identifier is a distinct type — a [`DriverId`] cannot be bound
//! where a [`RiderId`] is expected. All of them are valid by construction;
//! parsing from strings goes through [`std::str::FromStr`] and reports
//! [`ValidationError::InvalidIdentifier`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| ValidationError::InvalidIdentifier {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier of a ride. Immutable once the ride is created.
    RideId,
    "ride"
);

uuid_identifier!(
    /// Identifier of the rider who requested a ride.
    RiderId,
    "rider"
);

uuid_identifier!(
    /// Identifier of a driver. Bound to a ride when the ride is accepted.
    DriverId,
    "driver"
);

uuid_identifier!(
    /// Identifier of a platform administrator.
    AdminId,
    "admin"
);
