//! # Statuses and Operations
//!
//! The closed status set and the operation table. This is the only place
//! where "which operation moves a ride from where to where, and who may
//! invoke it" is written down.
//!
//! | Operation  | Source                  | Target       | Roles                 |
//! |------------|-------------------------|--------------|-----------------------|
//! | `request`  | (creation)              | `REQUESTED`  | rider                 |
//! | `accept`   | `REQUESTED`             | `ACCEPTED`   | driver                |
//! | `cancel`   | `REQUESTED`, `ACCEPTED` | `CANCELLED`  | rider, driver, admin  |
//! | `pickup`   | `ACCEPTED`              | `PICKED_UP`  | driver (bound)        |
//! | `transit`  | `PICKED_UP`             | `IN_TRANSIT` | driver (bound)        |
//! | `complete` | `IN_TRANSIT`            | `COMPLETED`  | driver (bound)        |

use ride_core::Role;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    /// Created by a rider, waiting for a driver.
    Requested,
    /// A driver has accepted and is bound to the ride.
    Accepted,
    /// The bound driver has collected the rider.
    PickedUp,
    /// The ride is under way.
    InTransit,
    /// The ride finished normally (terminal).
    Completed,
    /// The ride was cancelled before pickup (terminal).
    Cancelled,
}

impl RideStatus {
    /// All statuses, in normal progression order followed by `Cancelled`.
    pub const ALL: [RideStatus; 6] = [
        Self::Requested,
        Self::Accepted,
        Self::PickedUp,
        Self::InTransit,
        Self::Completed,
        Self::Cancelled,
    ];

    /// The normal progression, `REQUESTED` through `COMPLETED`.
    pub const PROGRESSION: [RideStatus; 5] = [
        Self::Requested,
        Self::Accepted,
        Self::PickedUp,
        Self::InTransit,
        Self::Completed,
    ];

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the ride can still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Requested | Self::Accepted)
    }

    /// Position in the normal progression. `None` for `Cancelled`.
    pub fn progression_index(&self) -> Option<usize> {
        Self::PROGRESSION.iter().position(|s| s == self)
    }

    /// Return the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Accepted => "ACCEPTED",
            Self::PickedUp => "PICKED_UP",
            Self::InTransit => "IN_TRANSIT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown ride status: {s}"))
    }
}

/// A named lifecycle operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideOperation {
    /// Create a ride (rider).
    Request,
    /// Accept a requested ride (driver).
    Accept,
    /// Cancel before pickup (owning rider, bound driver, admin).
    Cancel,
    /// Collect the rider (bound driver).
    Pickup,
    /// Start the journey (bound driver).
    Transit,
    /// Finish the journey (bound driver).
    Complete,
}

impl RideOperation {
    /// All operations.
    pub const ALL: [RideOperation; 6] = [
        Self::Request,
        Self::Accept,
        Self::Cancel,
        Self::Pickup,
        Self::Transit,
        Self::Complete,
    ];

    /// Operations that act on an existing ride.
    pub const TRANSITIONS: [RideOperation; 5] = [
        Self::Accept,
        Self::Cancel,
        Self::Pickup,
        Self::Transit,
        Self::Complete,
    ];

    /// States from which this operation may fire. Empty for `Request`,
    /// which creates the ride instead of moving it.
    pub fn source_states(&self) -> &'static [RideStatus] {
        match self {
            Self::Request => &[],
            Self::Accept => &[RideStatus::Requested],
            Self::Cancel => &[RideStatus::Requested, RideStatus::Accepted],
            Self::Pickup => &[RideStatus::Accepted],
            Self::Transit => &[RideStatus::PickedUp],
            Self::Complete => &[RideStatus::InTransit],
        }
    }

    /// The status a ride is in after this operation succeeds.
    pub fn target(&self) -> RideStatus {
        match self {
            Self::Request => RideStatus::Requested,
            Self::Accept => RideStatus::Accepted,
            Self::Cancel => RideStatus::Cancelled,
            Self::Pickup => RideStatus::PickedUp,
            Self::Transit => RideStatus::InTransit,
            Self::Complete => RideStatus::Completed,
        }
    }

    /// Whether the operation may fire from `status`.
    pub fn permits_from(&self, status: RideStatus) -> bool {
        self.source_states().contains(&status)
    }

    /// Roles that may invoke this operation at all. Finer checks (owning
    /// rider, bound driver) live in [`crate::policy`].
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Self::Request => &[Role::Rider],
            Self::Accept => &[Role::Driver],
            Self::Cancel => &[Role::Rider, Role::Driver, Role::Admin],
            Self::Pickup | Self::Transit | Self::Complete => &[Role::Driver],
        }
    }

    /// Whether only the bound driver may invoke this operation.
    pub fn requires_bound_driver(&self) -> bool {
        matches!(self, Self::Pickup | Self::Transit | Self::Complete)
    }

    /// The operation that moves a ride into `status`, if any.
    pub fn leading_to(status: RideStatus) -> RideOperation {
        match status {
            RideStatus::Requested => Self::Request,
            RideStatus::Accepted => Self::Accept,
            RideStatus::PickedUp => Self::Pickup,
            RideStatus::InTransit => Self::Transit,
            RideStatus::Completed => Self::Complete,
            RideStatus::Cancelled => Self::Cancel,
        }
    }

    /// Path segment used by the HTTP surface (`PATCH /v1/rides/:id/{segment}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Accept => "accept",
            Self::Cancel => "cancel",
            Self::Pickup => "pickup",
            Self::Transit => "transit",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for RideOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RideOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown ride operation: {s}"))
    }
}
