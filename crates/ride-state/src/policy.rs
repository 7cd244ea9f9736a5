//! # Transition Policy
//!
//! Who may invoke which operation. Authorization is an explicit function
//! of the ride and the actor, testable without any UI, and the same rules
//! drive both enforcement ([`authorize`]) and what a front end should offer
//! ([`available_operations`]) so the two cannot drift apart.
//!
//! State is checked before the actor: a terminal ride answers every
//! operation with `InvalidTransition`, whoever asks.

use ride_core::{Actor, Role};

use crate::error::RideError;
use crate::ride::Ride;
use crate::status::{RideOperation, RideStatus};

/// Order in which operations are offered to a viewer: the forward step
/// first, cancellation last.
const OFFER_ORDER: [RideOperation; 5] = [
    RideOperation::Accept,
    RideOperation::Pickup,
    RideOperation::Transit,
    RideOperation::Complete,
    RideOperation::Cancel,
];

/// Decide whether an actor with the given relationship to a ride may
/// invoke `operation`, ignoring the ride's status.
fn actor_permitted(
    operation: RideOperation,
    role: Role,
    is_bound_driver: bool,
    is_owner: bool,
) -> Result<(), String> {
    if !operation.allowed_roles().contains(&role) {
        return Err(format!("role {role} may not {operation} rides"));
    }
    match (operation, role) {
        (RideOperation::Cancel, Role::Rider) if !is_owner => {
            Err("only the rider who requested the ride may cancel it".into())
        }
        (RideOperation::Cancel, Role::Driver) if !is_bound_driver => {
            Err("only the driver bound to the ride may cancel it".into())
        }
        (op, Role::Driver) if op.requires_bound_driver() && !is_bound_driver => {
            Err(format!("only the driver bound to the ride may {op} it"))
        }
        _ => Ok(()),
    }
}

fn relationship(ride: &Ride, actor: &Actor) -> (bool, bool) {
    let is_bound_driver = actor
        .driver_id()
        .is_some_and(|d| ride.driver_id() == Some(d));
    let is_owner = actor.rider_id() == Some(ride.rider_id());
    (is_bound_driver, is_owner)
}

/// Check only the actor side of an operation on an existing ride.
///
/// # Errors
///
/// Returns [`RideError::Unauthorized`] when the actor's role or binding
/// does not allow the operation.
pub fn authorize(ride: &Ride, actor: &Actor, operation: RideOperation) -> Result<(), RideError> {
    let (is_bound_driver, is_owner) = relationship(ride, actor);
    actor_permitted(operation, actor.role(), is_bound_driver, is_owner).map_err(|reason| {
        RideError::Unauthorized {
            ride_id: Some(ride.id()),
            actor: *actor,
            operation,
            reason,
        }
    })
}

/// Full precondition check: source state first, then the actor.
///
/// # Errors
///
/// [`RideError::InvalidTransition`] if the ride is not in a source state of
/// `operation`; [`RideError::Unauthorized`] if the actor may not invoke it.
pub fn check(ride: &Ride, actor: &Actor, operation: RideOperation) -> Result<(), RideError> {
    if !operation.permits_from(ride.status()) {
        return Err(RideError::InvalidTransition {
            ride_id: ride.id(),
            current: ride.status(),
            operation,
            target: operation.target(),
        });
    }
    authorize(ride, actor, operation)
}

/// Whether `actor` may invoke `operation` on `ride` right now.
pub fn can_transition(ride: &Ride, actor: &Actor, operation: RideOperation) -> bool {
    check(ride, actor, operation).is_ok()
}

/// Operations a viewer may be offered, as a pure function of the ride's
/// status, the viewer's role and whether the viewer is the bound driver.
///
/// Riders only ever see their own rides, so a rider viewer is treated as
/// the owning rider.
pub fn available_operations(
    status: RideStatus,
    role: Role,
    is_bound_driver: bool,
) -> Vec<RideOperation> {
    offer(status, role, is_bound_driver, role == Role::Rider)
}

/// Operations `actor` may invoke on `ride` right now, including the
/// ownership check for riders.
pub fn operations_for(ride: &Ride, actor: &Actor) -> Vec<RideOperation> {
    let (is_bound_driver, is_owner) = relationship(ride, actor);
    offer(ride.status(), actor.role(), is_bound_driver, is_owner)
}

fn offer(status: RideStatus, role: Role, is_bound_driver: bool, is_owner: bool) -> Vec<RideOperation> {
    OFFER_ORDER
        .into_iter()
        .filter(|op| op.permits_from(status))
        .filter(|op| actor_permitted(*op, role, is_bound_driver, is_owner).is_ok())
        .collect()
}
