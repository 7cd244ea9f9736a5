//! A single actor's working copy of one ride.
//!
//! [`LifecycleSession`] checks every operation locally before sending it
//! and re-reads the ride before trusting a local refusal. It replaces its
//! copy with the server's answer on success and refreshes after any
//! definitive rejection, so the next render reflects reality.
//!
//! After a transient failure the outcome is unknown. The session re-reads
//! the ride and inspects the transition log: if the operation was recorded
//! for this actor, the earlier attempt went through and the result is
//! [`PerformOutcome::Reconciled`]. Nothing is ever resubmitted blindly.

use ride_core::{Actor, GeoPoint, RideId};
use ride_state::{LifecycleView, Ride, RideOperation, RideStatus};

use crate::error::RideClientError;
use crate::rides::{ListRidesParams, RideClient};

/// How a successful [`LifecycleSession::perform`] came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformOutcome {
    /// The server answered with the transitioned ride.
    Applied,
    /// The request failed transiently but a re-read showed it took effect.
    Reconciled,
}

/// One actor's view of one ride.
#[derive(Debug, Clone)]
pub struct LifecycleSession {
    client: RideClient,
    actor: Actor,
    ride: Ride,
}

impl LifecycleSession {
    /// Session over a ride the caller already holds.
    pub fn new(client: RideClient, actor: Actor, ride: Ride) -> Self {
        Self {
            client,
            actor,
            ride,
        }
    }

    /// Fetch a ride and open a session over it.
    pub async fn open(
        client: RideClient,
        actor: Actor,
        ride_id: RideId,
    ) -> Result<Self, RideClientError> {
        let ride = client.get_ride_details(ride_id).await?;
        Ok(Self::new(client, actor, ride))
    }

    /// Request a new ride as `actor` and open a session over it.
    ///
    /// A transient failure is reconciled by looking for this rider's
    /// `REQUESTED` ride with the same endpoints. A rider holds at most one
    /// active ride, so a match can only be the one this call created.
    pub async fn request(
        client: RideClient,
        actor: Actor,
        pickup: GeoPoint,
        destination: GeoPoint,
    ) -> Result<(Self, PerformOutcome), RideClientError> {
        match client.request_ride(&pickup, &destination).await {
            Ok(ride) => Ok((Self::new(client, actor, ride), PerformOutcome::Applied)),
            Err(err) if err.is_retryable() => {
                let params = ListRidesParams {
                    status: Some(RideStatus::Requested),
                    ..ListRidesParams::default()
                };
                let found = match client.get_all_rides(&params).await {
                    Ok(page) => page.data.into_iter().find(|r| {
                        Some(r.rider_id()) == actor.rider_id()
                            && r.pickup_location() == pickup
                            && r.destination() == destination
                    }),
                    Err(refresh_err) => {
                        tracing::warn!(error = %refresh_err, "could not reconcile ride request");
                        None
                    }
                };
                match found {
                    Some(ride) => {
                        tracing::info!(ride_id = %ride.id(), "reconciled ride request after transient failure");
                        Ok((Self::new(client, actor, ride), PerformOutcome::Reconciled))
                    }
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// The session's current copy of the ride.
    pub fn ride(&self) -> &Ride {
        &self.ride
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Operations this actor may invoke given the current copy.
    pub fn available_operations(&self) -> Vec<RideOperation> {
        self.ride.available_operations_for(&self.actor)
    }

    /// Presentation model for the current copy.
    pub fn view(&self) -> LifecycleView {
        LifecycleView::for_viewer(&self.ride, &self.actor)
    }

    /// Re-read the ride from the server.
    pub async fn refresh(&mut self) -> Result<&Ride, RideClientError> {
        self.ride = self.client.get_ride_details(self.ride.id()).await?;
        Ok(&self.ride)
    }

    /// Perform `operation` as this session's actor.
    ///
    /// When the local copy rules `operation` out, the ride is re-read once
    /// and the check repeated against the fresh copy; only a refusal that
    /// survives the re-read is returned, without sending the operation.
    pub async fn perform(
        &mut self,
        operation: RideOperation,
    ) -> Result<PerformOutcome, RideClientError> {
        self.recheck(operation).await?;

        match self.client.perform(self.ride.id(), operation).await {
            Ok(ride) => {
                self.ride = ride;
                Ok(PerformOutcome::Applied)
            }
            Err(
                err @ (RideClientError::InvalidTransition { .. }
                | RideClientError::Unauthorized { .. }
                | RideClientError::NotFound { .. }),
            ) => {
                if let Err(refresh_err) = self.refresh().await {
                    tracing::debug!(error = %refresh_err, "refresh after rejection failed");
                }
                Err(err)
            }
            Err(err) if err.is_retryable() => self.reconcile(operation, err).await,
            Err(err) => Err(err),
        }
    }

    pub async fn accept(&mut self) -> Result<PerformOutcome, RideClientError> {
        self.perform(RideOperation::Accept).await
    }

    pub async fn cancel(&mut self) -> Result<PerformOutcome, RideClientError> {
        self.perform(RideOperation::Cancel).await
    }

    pub async fn pickup(&mut self) -> Result<PerformOutcome, RideClientError> {
        self.perform(RideOperation::Pickup).await
    }

    pub async fn transit(&mut self) -> Result<PerformOutcome, RideClientError> {
        self.perform(RideOperation::Transit).await
    }

    pub async fn complete(&mut self) -> Result<PerformOutcome, RideClientError> {
        self.perform(RideOperation::Complete).await
    }

    async fn recheck(&mut self, operation: RideOperation) -> Result<(), RideClientError> {
        let Err(stale) = self.ride.check(&self.actor, operation) else {
            return Ok(());
        };
        match self.refresh().await {
            Ok(_) => {}
            Err(err) if err.is_retryable() => {
                tracing::debug!(error = %err, "refresh before local refusal failed");
                return Err(stale.into());
            }
            Err(err) => return Err(err),
        }
        self.ride.check(&self.actor, operation)?;
        tracing::debug!(
            ride_id = %self.ride.id(),
            operation = %operation,
            "local copy was stale, proceeding after refresh"
        );
        Ok(())
    }

    async fn reconcile(
        &mut self,
        operation: RideOperation,
        original: RideClientError,
    ) -> Result<PerformOutcome, RideClientError> {
        let fresh = match self.client.get_ride_details(self.ride.id()).await {
            Ok(ride) => ride,
            Err(refresh_err) => {
                tracing::warn!(
                    ride_id = %self.ride.id(),
                    %operation,
                    error = %refresh_err,
                    "could not reconcile after transient failure"
                );
                return Err(original);
            }
        };

        let applied = applied_by(&fresh, operation, &self.actor);
        self.ride = fresh;
        if applied {
            tracing::info!(
                ride_id = %self.ride.id(),
                %operation,
                "transition took effect despite transient failure"
            );
            Ok(PerformOutcome::Reconciled)
        } else {
            Err(original)
        }
    }
}

/// Whether `ride` records `operation` as performed by `actor`.
pub fn applied_by(ride: &Ride, operation: RideOperation, actor: &Actor) -> bool {
    ride.transitions()
        .iter()
        .any(|t| t.operation == operation && t.actor == *actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::{DriverId, Fare, RiderId};

    fn ride(rider: RiderId) -> Ride {
        Ride::request(
            &Actor::Rider(rider),
            GeoPoint::new(40.7128, -74.0060).unwrap(),
            GeoPoint::new(40.7580, -73.9855).unwrap(),
            Fare::from_cents(1250),
        )
        .unwrap()
    }

    #[test]
    fn applied_by_matches_actor_and_operation() {
        let rider = RiderId::new();
        let driver = Actor::Driver(DriverId::new());
        let other = Actor::Driver(DriverId::new());
        let mut r = ride(rider);
        r.accept(&driver).unwrap();

        assert!(applied_by(&r, RideOperation::Accept, &driver));
        assert!(!applied_by(&r, RideOperation::Accept, &other));
        assert!(!applied_by(&r, RideOperation::Cancel, &driver));
    }

    #[test]
    fn cancel_by_someone_else_is_not_reconciled() {
        let rider = RiderId::new();
        let driver = Actor::Driver(DriverId::new());
        let mut r = ride(rider);
        r.cancel(&Actor::Rider(rider)).unwrap();
        assert!(!applied_by(&r, RideOperation::Cancel, &driver));
    }
}
