//! Property tests: arbitrary operation sequences from a fixed cast of
//! actors never drive a ride into an inconsistent record.

use proptest::prelude::*;
use ride_core::{Actor, AdminId, DriverId, Fare, GeoPoint, RiderId};
use ride_state::{Ride, RideError, RideOperation, RideStatus};

const OPERATIONS: [RideOperation; 6] = [
    RideOperation::Request,
    RideOperation::Accept,
    RideOperation::Cancel,
    RideOperation::Pickup,
    RideOperation::Transit,
    RideOperation::Complete,
];

struct Cast {
    owner: Actor,
    actors: [Actor; 5],
}

fn cast() -> Cast {
    let owner = Actor::Rider(RiderId::new());
    Cast {
        owner,
        actors: [
            owner,
            Actor::Rider(RiderId::new()),
            Actor::Driver(DriverId::new()),
            Actor::Driver(DriverId::new()),
            Actor::Admin(AdminId::new()),
        ],
    }
}

fn steps() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..OPERATIONS.len(), 0..5usize), 0..24)
}

fn rank(status: RideStatus) -> usize {
    status.progression_index().unwrap_or(usize::MAX)
}

proptest! {
    #[test]
    fn every_reachable_record_verifies(seq in steps()) {
        let cast = cast();
        let mut ride = Ride::request(
            &cast.owner,
            GeoPoint::new(40.7128, -74.0060).unwrap(),
            GeoPoint::new(40.7580, -73.9855).unwrap(),
            Fare::from_cents(1250),
        )
        .unwrap();

        for (op_idx, actor_idx) in seq {
            let op = OPERATIONS[op_idx];
            let actor = cast.actors[actor_idx];
            let before = ride.clone();
            let allowed = before.can_transition(&actor, op);

            let result = ride.apply(op, &actor).map(|record| record.clone());
            prop_assert_eq!(result.is_ok(), allowed);

            match result {
                Ok(record) => {
                    prop_assert_eq!(record.from, before.status());
                    prop_assert_eq!(record.to, op.target());
                    prop_assert_eq!(ride.status(), op.target());
                    prop_assert!(!before.is_terminal());
                    if let Some(driver) = before.driver_id() {
                        prop_assert_eq!(ride.driver_id(), Some(driver));
                    }
                    if ride.status() != RideStatus::Cancelled {
                        prop_assert!(rank(ride.status()) > rank(before.status()));
                    }
                }
                Err(_) => prop_assert_eq!(&ride, &before),
            }

            prop_assert!(ride.verify().is_ok(), "{:?}", ride.verify());
        }
    }

    #[test]
    fn terminal_rides_reject_everything(completed in any::<bool>(), seq in steps()) {
        let cast = cast();
        let mut ride = Ride::request(
            &cast.owner,
            GeoPoint::new(0.0, 0.0).unwrap(),
            GeoPoint::new(1.0, 1.0).unwrap(),
            Fare::from_cents(500),
        )
        .unwrap();
        let terminal = if completed {
            let driver = cast.actors[2];
            ride.accept(&driver).unwrap();
            ride.pickup(&driver).unwrap();
            ride.transit(&driver).unwrap();
            ride.complete(&driver).unwrap();
            RideStatus::Completed
        } else {
            ride.cancel(&cast.owner).unwrap();
            RideStatus::Cancelled
        };
        let recorded = ride.transitions().len();
        let before = ride.clone();

        for (op_idx, actor_idx) in seq {
            let actor = cast.actors[actor_idx];
            let err = ride.apply(OPERATIONS[op_idx], &actor).unwrap_err();
            prop_assert!(
                matches!(err, RideError::InvalidTransition { current, .. } if current == terminal),
                "{:?}",
                err
            );
        }
        prop_assert_eq!(ride.transitions().len(), recorded);
        prop_assert_eq!(&ride, &before);
    }
}
