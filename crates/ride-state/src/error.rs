//! # Lifecycle Errors
//!
//! A transition attempt fails in exactly one of two ways: the ride is not
//! in a state the operation can fire from, or the actor is not permitted to
//! invoke it. The two are distinct so that callers can tell "refresh and
//! try something else" apart from "you may not do this".

use ride_core::{Actor, RideId};
use thiserror::Error;

use crate::status::{RideOperation, RideStatus};

/// Errors from lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RideError {
    /// The operation's source-state precondition was not met.
    #[error("invalid ride transition for {ride_id}: cannot {operation} ({current} -> {target})")]
    InvalidTransition {
        /// The ride.
        ride_id: RideId,
        /// Status the ride is actually in.
        current: RideStatus,
        /// The attempted operation.
        operation: RideOperation,
        /// Status the operation would have produced.
        target: RideStatus,
    },

    /// The actor may not invoke this operation on this ride.
    #[error("{actor} is not permitted to {operation}: {reason}")]
    Unauthorized {
        /// The ride, absent when the failed operation was a creation.
        ride_id: Option<RideId>,
        /// Who attempted the operation.
        actor: Actor,
        /// The attempted operation.
        operation: RideOperation,
        /// Human-readable explanation.
        reason: String,
    },
}

impl RideError {
    /// The ride's actual status, for invalid transitions.
    pub fn current_status(&self) -> Option<RideStatus> {
        match self {
            Self::InvalidTransition { current, .. } => Some(*current),
            Self::Unauthorized { .. } => None,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> RideOperation {
        match self {
            Self::InvalidTransition { operation, .. } | Self::Unauthorized { operation, .. } => {
                *operation
            }
        }
    }
}

/// A ride record whose fields disagree with its status.
///
/// Raised by [`crate::Ride::verify`] for records that did not come out of
/// this state machine (network responses, storage).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ride {ride_id} violates lifecycle invariant: {detail}")]
pub struct IntegrityError {
    /// The offending ride.
    pub ride_id: RideId,
    /// What disagreed.
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::DriverId;

    #[test]
    fn invalid_transition_names_both_states() {
        let err = RideError::InvalidTransition {
            ride_id: RideId::new(),
            current: RideStatus::Requested,
            operation: RideOperation::Pickup,
            target: RideStatus::PickedUp,
        };
        let msg = err.to_string();
        assert!(msg.contains("REQUESTED"));
        assert!(msg.contains("PICKED_UP"));
        assert!(msg.contains("pickup"));
        assert_eq!(err.current_status(), Some(RideStatus::Requested));
    }

    #[test]
    fn unauthorized_names_actor_and_reason() {
        let driver = DriverId::new();
        let err = RideError::Unauthorized {
            ride_id: None,
            actor: Actor::Driver(driver),
            operation: RideOperation::Complete,
            reason: "not the bound driver".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains(&driver.to_string()));
        assert!(msg.contains("not the bound driver"));
        assert_eq!(err.current_status(), None);
        assert_eq!(err.operation(), RideOperation::Complete);
    }
}
