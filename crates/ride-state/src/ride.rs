//! # Ride
//!
//! The central record. A ride is created by a rider in `REQUESTED` and is
//! then mutated exclusively through [`Ride::apply`] (or the named
//! convenience methods), each of which validates the source state and the
//! actor, stamps exactly one lifecycle timestamp and appends one entry to
//! the transition log.
//!
//! Fields are private: the only way to change status, timestamps, driver
//! binding or canceller is a successful transition. Records that arrive
//! from outside the state machine (storage, the network) can be checked
//! with [`Ride::verify`].

use ride_core::{Actor, DriverId, Fare, GeoPoint, RideId, RiderId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{IntegrityError, RideError};
use crate::policy;
use crate::status::{RideOperation, RideStatus};

/// One entry of a ride's transition log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideTransitionRecord {
    /// Status before the transition.
    pub from: RideStatus,
    /// Status after the transition.
    pub to: RideStatus,
    /// The operation that fired.
    pub operation: RideOperation,
    /// Who invoked it.
    pub actor: Actor,
    /// When it happened. Equal to the lifecycle timestamp it stamped.
    pub at: Timestamp,
}

/// A ride and its lifecycle position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    id: RideId,
    rider_id: RiderId,
    driver_id: Option<DriverId>,
    pickup: GeoPoint,
    destination: GeoPoint,
    #[serde(rename = "fare_cents")]
    fare: Fare,
    status: RideStatus,
    requested_at: Timestamp,
    accepted_at: Option<Timestamp>,
    picked_up_at: Option<Timestamp>,
    transit_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
    cancelled_at: Option<Timestamp>,
    cancelled_by: Option<Actor>,
    #[serde(default)]
    transitions: Vec<RideTransitionRecord>,
}

impl Ride {
    /// Create a ride in `REQUESTED` (the `request` operation).
    ///
    /// # Errors
    ///
    /// [`RideError::Unauthorized`] unless `actor` is a rider.
    pub fn request(
        actor: &Actor,
        pickup: GeoPoint,
        destination: GeoPoint,
        fare: Fare,
    ) -> Result<Self, RideError> {
        Self::request_at(actor, pickup, destination, fare, Timestamp::now())
    }

    /// [`Ride::request`] with an explicit creation time.
    pub fn request_at(
        actor: &Actor,
        pickup: GeoPoint,
        destination: GeoPoint,
        fare: Fare,
        at: Timestamp,
    ) -> Result<Self, RideError> {
        let rider_id = actor.rider_id().ok_or_else(|| RideError::Unauthorized {
            ride_id: None,
            actor: *actor,
            operation: RideOperation::Request,
            reason: format!("role {} may not request rides", actor.role()),
        })?;

        let ride = Self {
            id: RideId::new(),
            rider_id,
            driver_id: None,
            pickup,
            destination,
            fare,
            status: RideStatus::Requested,
            requested_at: at,
            accepted_at: None,
            picked_up_at: None,
            transit_at: None,
            completed_at: None,
            cancelled_at: None,
            cancelled_by: None,
            transitions: Vec::new(),
        };
        tracing::info!(ride_id = %ride.id, rider_id = %rider_id, fare = %fare, "ride requested");
        Ok(ride)
    }

    /// Accept a requested ride and bind the driver (REQUESTED → ACCEPTED).
    pub fn accept(&mut self, actor: &Actor) -> Result<(), RideError> {
        self.apply(RideOperation::Accept, actor).map(|_| ())
    }

    /// Cancel before pickup (REQUESTED | ACCEPTED → CANCELLED).
    pub fn cancel(&mut self, actor: &Actor) -> Result<(), RideError> {
        self.apply(RideOperation::Cancel, actor).map(|_| ())
    }

    /// Collect the rider (ACCEPTED → PICKED_UP).
    pub fn pickup(&mut self, actor: &Actor) -> Result<(), RideError> {
        self.apply(RideOperation::Pickup, actor).map(|_| ())
    }

    /// Start the journey (PICKED_UP → IN_TRANSIT).
    pub fn transit(&mut self, actor: &Actor) -> Result<(), RideError> {
        self.apply(RideOperation::Transit, actor).map(|_| ())
    }

    /// Finish the journey (IN_TRANSIT → COMPLETED).
    pub fn complete(&mut self, actor: &Actor) -> Result<(), RideError> {
        self.apply(RideOperation::Complete, actor).map(|_| ())
    }

    /// Apply `operation` on behalf of `actor` at the current time.
    pub fn apply(
        &mut self,
        operation: RideOperation,
        actor: &Actor,
    ) -> Result<&RideTransitionRecord, RideError> {
        self.apply_at(operation, actor, Timestamp::now())
    }

    /// Apply `operation` on behalf of `actor` at `at`.
    ///
    /// On failure the ride is left untouched. On success exactly one
    /// lifecycle timestamp is set and one log entry appended. `at` is
    /// clamped to the latest existing timestamp so the lifecycle never runs
    /// backwards under clock skew.
    ///
    /// # Errors
    ///
    /// See [`policy::check`].
    pub fn apply_at(
        &mut self,
        operation: RideOperation,
        actor: &Actor,
        at: Timestamp,
    ) -> Result<&RideTransitionRecord, RideError> {
        if let Err(err) = policy::check(self, actor, operation) {
            tracing::warn!(ride_id = %self.id, %operation, actor = %actor, status = %self.status, error = %err, "ride transition rejected");
            return Err(err);
        }

        let at = at.max(self.last_event_at());
        let from = self.status;
        let to = operation.target();

        let Some(slot) = self.timestamp_slot(operation) else {
            return Err(RideError::InvalidTransition {
                ride_id: self.id,
                current: from,
                operation,
                target: to,
            });
        };
        *slot = Some(at);
        if operation == RideOperation::Accept {
            self.driver_id = actor.driver_id();
        }
        if operation == RideOperation::Cancel {
            self.cancelled_by = Some(*actor);
        }
        self.status = to;
        self.transitions.push(RideTransitionRecord {
            from,
            to,
            operation,
            actor: *actor,
            at,
        });

        tracing::info!(ride_id = %self.id, %operation, %from, %to, actor = %actor, "ride transitioned");
        Ok(&self.transitions[self.transitions.len() - 1])
    }

    /// The lifecycle timestamp `operation` sets. `Request` creates a ride
    /// and never transitions one, so it has none.
    fn timestamp_slot(&mut self, operation: RideOperation) -> Option<&mut Option<Timestamp>> {
        match operation {
            RideOperation::Request => None,
            RideOperation::Accept => Some(&mut self.accepted_at),
            RideOperation::Cancel => Some(&mut self.cancelled_at),
            RideOperation::Pickup => Some(&mut self.picked_up_at),
            RideOperation::Transit => Some(&mut self.transit_at),
            RideOperation::Complete => Some(&mut self.completed_at),
        }
    }

    /// Validate `operation` for `actor` without applying it.
    pub fn check(&self, actor: &Actor, operation: RideOperation) -> Result<(), RideError> {
        policy::check(self, actor, operation)
    }

    /// Whether `actor` may invoke `operation` right now.
    pub fn can_transition(&self, actor: &Actor, operation: RideOperation) -> bool {
        policy::can_transition(self, actor, operation)
    }

    /// Operations `actor` may invoke right now, forward step first.
    pub fn available_operations_for(&self, actor: &Actor) -> Vec<RideOperation> {
        policy::operations_for(self, actor)
    }

    pub fn id(&self) -> RideId {
        self.id
    }

    pub fn rider_id(&self) -> RiderId {
        self.rider_id
    }

    /// The bound driver, set once the ride is accepted.
    pub fn driver_id(&self) -> Option<DriverId> {
        self.driver_id
    }

    pub fn pickup_location(&self) -> GeoPoint {
        self.pickup
    }

    pub fn destination(&self) -> GeoPoint {
        self.destination
    }

    pub fn fare(&self) -> Fare {
        self.fare
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn requested_at(&self) -> Timestamp {
        self.requested_at
    }

    pub fn accepted_at(&self) -> Option<Timestamp> {
        self.accepted_at
    }

    pub fn picked_up_at(&self) -> Option<Timestamp> {
        self.picked_up_at
    }

    pub fn transit_at(&self) -> Option<Timestamp> {
        self.transit_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    pub fn cancelled_at(&self) -> Option<Timestamp> {
        self.cancelled_at
    }

    /// Who cancelled the ride, once it is `CANCELLED`.
    pub fn cancelled_by(&self) -> Option<Actor> {
        self.cancelled_by
    }

    /// Ordered transition log, creation excluded.
    pub fn transitions(&self) -> &[RideTransitionRecord] {
        &self.transitions
    }

    /// Whether `driver` is the driver bound to this ride.
    pub fn is_bound_driver(&self, driver: DriverId) -> bool {
        self.driver_id == Some(driver)
    }

    /// The timestamp recorded on entering `status`, if the ride reached it.
    pub fn timestamp_of(&self, status: RideStatus) -> Option<Timestamp> {
        match status {
            RideStatus::Requested => Some(self.requested_at),
            RideStatus::Accepted => self.accepted_at,
            RideStatus::PickedUp => self.picked_up_at,
            RideStatus::InTransit => self.transit_at,
            RideStatus::Completed => self.completed_at,
            RideStatus::Cancelled => self.cancelled_at,
        }
    }

    /// Whether the ride has at some point been in `status`.
    pub fn has_reached(&self, status: RideStatus) -> bool {
        self.timestamp_of(status).is_some()
    }

    fn last_event_at(&self) -> Timestamp {
        RideStatus::ALL
            .into_iter()
            .filter_map(|s| self.timestamp_of(s))
            .max()
            .unwrap_or(self.requested_at)
    }

    /// Check that status, timestamps, driver binding, canceller and the
    /// transition log agree with each other.
    ///
    /// # Errors
    ///
    /// [`IntegrityError`] describing the first disagreement found.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        let fail = |detail: String| {
            Err(IntegrityError {
                ride_id: self.id,
                detail,
            })
        };

        match self.status.progression_index() {
            Some(reached) => {
                for (idx, status) in RideStatus::PROGRESSION.iter().enumerate() {
                    let set = self.timestamp_of(*status).is_some();
                    if set != (idx <= reached) {
                        return fail(format!(
                            "status {} but {} timestamp is {}",
                            self.status,
                            status,
                            if set { "set" } else { "missing" }
                        ));
                    }
                }
                if self.cancelled_at.is_some() || self.cancelled_by.is_some() {
                    return fail(format!("status {} but cancellation recorded", self.status));
                }
            }
            None => {
                if self.cancelled_at.is_none() || self.cancelled_by.is_none() {
                    return fail("status CANCELLED without cancellation time and canceller".into());
                }
                for status in [RideStatus::PickedUp, RideStatus::InTransit, RideStatus::Completed] {
                    if self.has_reached(status) {
                        return fail(format!("cancelled ride has {status} timestamp"));
                    }
                }
            }
        }

        if self.driver_id.is_some() != self.accepted_at.is_some() {
            return fail("driver binding disagrees with acceptance time".into());
        }

        match self.cancelled_by {
            Some(Actor::Rider(r)) if r != self.rider_id => {
                return fail("cancelled by a rider who does not own the ride".into());
            }
            Some(Actor::Driver(d)) if self.driver_id != Some(d) => {
                return fail("cancelled by a driver who is not bound to the ride".into());
            }
            _ => {}
        }

        let ordered: Vec<Timestamp> = RideStatus::ALL
            .into_iter()
            .filter_map(|s| self.timestamp_of(s))
            .collect();
        if ordered.windows(2).any(|w| w[0] > w[1]) {
            return fail("lifecycle timestamps are out of order".into());
        }

        let mut position = RideStatus::Requested;
        for record in &self.transitions {
            if record.from != position
                || !record.operation.permits_from(record.from)
                || record.operation.target() != record.to
            {
                return fail(format!(
                    "transition log entry {} -> {} via {} does not follow from {}",
                    record.from, record.to, record.operation, position
                ));
            }
            if self.timestamp_of(record.to) != Some(record.at) {
                return fail(format!("transition log time for {} disagrees with timestamp", record.to));
            }
            position = record.to;
        }
        if position != self.status {
            return fail(format!(
                "transition log ends at {position} but status is {}",
                self.status
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::{AdminId, Role};

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn new_ride() -> (Ride, RiderId) {
        let rider = RiderId::new();
        let ride = Ride::request(
            &Actor::Rider(rider),
            point(23.8103, 90.4125),
            point(23.7509, 90.3935),
            Fare::from_cents(1250),
        )
        .unwrap();
        (ride, rider)
    }

    fn accepted() -> (Ride, RiderId, Actor) {
        let (mut ride, rider) = new_ride();
        let driver = Actor::Driver(DriverId::new());
        ride.accept(&driver).unwrap();
        (ride, rider, driver)
    }

    fn assert_invalid(err: RideError, current: RideStatus) {
        match err {
            RideError::InvalidTransition { current: c, .. } => assert_eq!(c, current),
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    // ── Creation ─────────────────────────────────────────────────────

    #[test]
    fn request_creates_requested_ride() {
        let (ride, rider) = new_ride();
        assert_eq!(ride.status(), RideStatus::Requested);
        assert_eq!(ride.rider_id(), rider);
        assert!(ride.driver_id().is_none());
        assert!(ride.accepted_at().is_none());
        assert!(ride.transitions().is_empty());
        ride.verify().unwrap();
    }

    #[test]
    fn only_riders_may_request() {
        for actor in [Actor::Driver(DriverId::new()), Actor::Admin(AdminId::new())] {
            let err = Ride::request(&actor, point(0.0, 0.0), point(1.0, 1.0), Fare::ZERO)
                .unwrap_err();
            assert!(matches!(err, RideError::Unauthorized { ride_id: None, .. }));
        }
    }

    // ── Scenario: pickup before accept ───────────────────────────────

    #[test]
    fn pickup_before_accept_is_invalid() {
        let (mut ride, _) = new_ride();
        let before = ride.clone();
        let err = ride.pickup(&Actor::Driver(DriverId::new())).unwrap_err();
        assert_invalid(err, RideStatus::Requested);
        assert_eq!(ride, before);
    }

    #[test]
    fn request_is_not_a_transition() {
        let (mut ride, rider) = new_ride();
        let before = ride.clone();
        let err = ride.apply(RideOperation::Request, &Actor::Rider(rider)).unwrap_err();
        assert!(matches!(
            err,
            RideError::InvalidTransition {
                current: RideStatus::Requested,
                operation: RideOperation::Request,
                ..
            }
        ));
        assert_eq!(ride, before);
        assert!(ride.transitions().is_empty());
    }

    // ── Scenario: double accept ──────────────────────────────────────

    #[test]
    fn accept_binds_driver_and_second_accept_fails() {
        let (mut ride, _, first) = accepted();
        assert_eq!(ride.status(), RideStatus::Accepted);
        assert_eq!(ride.driver_id(), first.driver_id());
        assert!(ride.accepted_at().is_some());

        let second = Actor::Driver(DriverId::new());
        let err = ride.accept(&second).unwrap_err();
        assert_invalid(err, RideStatus::Accepted);
        assert_eq!(ride.driver_id(), first.driver_id());
        assert_eq!(ride.transitions().len(), 1);
    }

    // ── Scenario: rider cancels after accept ─────────────────────────

    #[test]
    fn rider_cancels_accepted_ride() {
        let (mut ride, rider, driver) = accepted();
        ride.cancel(&Actor::Rider(rider)).unwrap();
        assert_eq!(ride.status(), RideStatus::Cancelled);
        assert!(ride.cancelled_at().is_some());
        assert_eq!(ride.cancelled_by().map(|a| a.role()), Some(Role::Rider));
        ride.verify().unwrap();

        let err = ride.pickup(&driver).unwrap_err();
        assert_invalid(err, RideStatus::Cancelled);
    }

    #[test]
    fn cancel_while_requested_keeps_driver_unset() {
        let (mut ride, _) = new_ride();
        ride.cancel(&Actor::Admin(AdminId::new())).unwrap();
        assert!(ride.driver_id().is_none());
        assert!(ride.accepted_at().is_none());
        ride.verify().unwrap();
    }

    #[test]
    fn bound_driver_may_cancel_accepted_ride() {
        let (mut ride, _, driver) = accepted();
        ride.cancel(&driver).unwrap();
        assert_eq!(ride.cancelled_by(), Some(driver));
        ride.verify().unwrap();
    }

    // ── Scenario: cancellation window closed ─────────────────────────

    #[test]
    fn cancel_after_pickup_is_invalid_for_everyone() {
        let (mut ride, rider, driver) = accepted();
        ride.pickup(&driver).unwrap();
        for actor in [driver, Actor::Rider(rider), Actor::Admin(AdminId::new())] {
            let err = ride.cancel(&actor).unwrap_err();
            assert_invalid(err, RideStatus::PickedUp);
        }
        assert!(ride.cancelled_at().is_none());
    }

    // ── Scenario: happy path ─────────────────────────────────────────

    #[test]
    fn full_lifecycle_sets_all_timestamps_in_order() {
        let (mut ride, rider, driver) = accepted();
        ride.pickup(&driver).unwrap();
        ride.transit(&driver).unwrap();
        ride.complete(&driver).unwrap();

        assert_eq!(ride.status(), RideStatus::Completed);
        assert!(ride.is_terminal());
        let stamps: Vec<Timestamp> = RideStatus::PROGRESSION
            .iter()
            .map(|s| ride.timestamp_of(*s).unwrap())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(ride.cancelled_at().is_none());
        assert_eq!(ride.transitions().len(), 4);
        ride.verify().unwrap();

        let everyone = [
            Actor::Rider(rider),
            driver,
            Actor::Driver(DriverId::new()),
            Actor::Rider(RiderId::new()),
            Actor::Admin(AdminId::new()),
        ];
        for actor in everyone {
            for op in RideOperation::ALL {
                assert_invalid(ride.apply(op, &actor).unwrap_err(), RideStatus::Completed);
            }
        }
        assert_eq!(ride.transitions().len(), 4);
    }

    // ── Authorization ────────────────────────────────────────────────

    #[test]
    fn other_driver_cannot_drive_bound_ride() {
        let (mut ride, _, driver) = accepted();
        let intruder = Actor::Driver(DriverId::new());

        assert!(matches!(ride.pickup(&intruder), Err(RideError::Unauthorized { .. })));
        ride.pickup(&driver).unwrap();
        assert!(matches!(ride.transit(&intruder), Err(RideError::Unauthorized { .. })));
        ride.transit(&driver).unwrap();
        assert!(matches!(ride.complete(&intruder), Err(RideError::Unauthorized { .. })));
        assert_eq!(ride.status(), RideStatus::InTransit);
    }

    // ── Idempotence ──────────────────────────────────────────────────

    #[test]
    fn repeating_an_applied_transition_fails() {
        let (mut ride, _, driver) = accepted();
        ride.pickup(&driver).unwrap();
        let stamp = ride.picked_up_at();
        let err = ride.pickup(&driver).unwrap_err();
        assert_invalid(err, RideStatus::PickedUp);
        assert_eq!(ride.picked_up_at(), stamp);
        assert_eq!(ride.transitions().len(), 2);
    }

    #[test]
    fn explicit_earlier_time_is_clamped() {
        use chrono::{TimeZone, Utc};
        let (mut ride, _, driver) = accepted();
        let past = Timestamp::from(Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        ride.apply_at(RideOperation::Pickup, &driver, past).unwrap();
        assert!(ride.picked_up_at() >= ride.accepted_at());
        ride.verify().unwrap();
    }

    #[test]
    fn available_operations_follow_binding() {
        let (ride, rider, driver) = accepted();
        assert_eq!(
            ride.available_operations_for(&driver),
            vec![RideOperation::Pickup, RideOperation::Cancel]
        );
        assert_eq!(
            ride.available_operations_for(&Actor::Rider(rider)),
            vec![RideOperation::Cancel]
        );
        assert!(ride
            .available_operations_for(&Actor::Driver(DriverId::new()))
            .is_empty());
    }

    // ── Serialization & integrity ────────────────────────────────────

    #[test]
    fn serialized_record_uses_wire_names() {
        let (ride, _, _) = accepted();
        let json = serde_json::to_value(&ride).unwrap();
        assert_eq!(json["status"], "ACCEPTED");
        assert!(json["accepted_at"].is_string());
        assert!(json["picked_up_at"].is_null());
        assert_eq!(json["fare_cents"], 1250);
        assert_eq!(json["transitions"][0]["operation"], "accept");
        let back: Ride = serde_json::from_value(json).unwrap();
        assert_eq!(back, ride);
        back.verify().unwrap();
    }

    #[test]
    fn verify_rejects_status_without_timestamp() {
        let (ride, _, _) = accepted();
        let mut json = serde_json::to_value(&ride).unwrap();
        json["status"] = "IN_TRANSIT".into();
        let tampered: Ride = serde_json::from_value(json).unwrap();
        let err = tampered.verify().unwrap_err();
        assert!(err.detail.contains("PICKED_UP"), "{err}");
    }

    #[test]
    fn verify_rejects_driver_on_requested_ride() {
        let (ride, _) = new_ride();
        let mut json = serde_json::to_value(&ride).unwrap();
        json["driver_id"] = DriverId::new().to_string().into();
        let tampered: Ride = serde_json::from_value(json).unwrap();
        assert!(tampered.verify().is_err());
    }

    #[test]
    fn verify_rejects_cancelled_without_canceller() {
        let (mut ride, _) = new_ride();
        ride.cancel(&Actor::Admin(AdminId::new())).unwrap();
        let mut json = serde_json::to_value(&ride).unwrap();
        json["cancelled_by"] = serde_json::Value::Null;
        let tampered: Ride = serde_json::from_value(json).unwrap();
        assert!(tampered.verify().is_err());
    }

    #[test]
    fn verify_rejects_truncated_log() {
        let (mut ride, _, driver) = accepted();
        ride.pickup(&driver).unwrap();
        let mut json = serde_json::to_value(&ride).unwrap();
        json["transitions"].as_array_mut().unwrap().pop();
        let tampered: Ride = serde_json::from_value(json).unwrap();
        let err = tampered.verify().unwrap_err();
        assert!(err.detail.contains("transition log ends at"), "{err}");
    }
}
