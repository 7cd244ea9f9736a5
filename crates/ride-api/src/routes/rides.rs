//! # Ride Lifecycle API
//!
//! Creation, the five state-changing transitions, details, role-scoped
//! listing and the per-viewer lifecycle view.
//!
//! Every transition runs as a single read-validate-update under the ride
//! store's write lock, so two concurrent `accept` calls on the same ride
//! produce exactly one success and one `INVALID_TRANSITION`.

use std::cmp::Ordering;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use ride_core::{Actor, GeoPoint};
use ride_state::{LifecycleView, Ride, RideOperation, RideStatus};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, extract_validated_query, Validate};
use crate::state::AppState;

// -- DTOs ---------------------------------------------------------------------

/// A coordinate pair as sent by clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl TryFrom<Coordinates> for GeoPoint {
    type Error = ride_core::ValidationError;

    fn try_from(c: Coordinates) -> Result<Self, Self::Error> {
        GeoPoint::new(c.latitude, c.longitude)
    }
}

/// Request to create a ride.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RequestRideBody {
    pub pickup_location: Coordinates,
    pub destination_location: Coordinates,
}

impl Validate for RequestRideBody {
    fn validate(&self) -> Result<(), String> {
        let pickup = GeoPoint::try_from(self.pickup_location)
            .map_err(|e| format!("pickup_location: {e}"))?;
        let destination = GeoPoint::try_from(self.destination_location)
            .map_err(|e| format!("destination_location: {e}"))?;
        if pickup == destination {
            return Err("pickup_location and destination_location must differ".to_string());
        }
        Ok(())
    }
}

/// Sort key for ride listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Status,
    Fare,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters for `GET /v1/rides`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRidesQuery {
    /// 1-based page number (default 1).
    pub page: Option<usize>,
    /// Page size (default 10, max 100).
    pub limit: Option<usize>,
    /// `created_at` (default), `status` or `fare`.
    #[param(value_type = Option<String>)]
    pub sort: Option<SortField>,
    /// `asc` or `desc` (default).
    #[param(value_type = Option<String>)]
    pub order: Option<SortOrder>,
    /// Only rides in this status.
    #[param(value_type = Option<String>)]
    pub status: Option<RideStatus>,
}

impl ListRidesQuery {
    const DEFAULT_LIMIT: usize = 10;
    const MAX_LIMIT: usize = 100;

    fn effective_page(&self) -> usize {
        self.page.unwrap_or(1)
    }

    fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .min(Self::MAX_LIMIT)
    }
}

impl Validate for ListRidesQuery {
    fn validate(&self) -> Result<(), String> {
        if self.page == Some(0) {
            return Err("page must be at least 1".to_string());
        }
        if self.limit == Some(0) {
            return Err("limit must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub page: usize,
    pub limit: usize,
    pub total_docs: usize,
    pub total_pages: usize,
}

/// One page of rides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidePage {
    pub data: Vec<Ride>,
    pub meta: PageMeta,
}

// -- Visibility ---------------------------------------------------------------

/// Whether `actor` may read `ride` by id. Same scope as the listing: a ride
/// a caller cannot list reads as not found.
fn readable_by(ride: &Ride, actor: &Actor) -> bool {
    listed_for(ride, actor)
}

/// Whether `ride` appears in `actor`'s listing: riders see their own,
/// drivers see rides bound to them plus open requests, admins see all.
fn listed_for(ride: &Ride, actor: &Actor) -> bool {
    match actor {
        Actor::Rider(rider) => ride.rider_id() == *rider,
        Actor::Driver(driver) => {
            ride.is_bound_driver(*driver)
                || (ride.status() == RideStatus::Requested && ride.driver_id().is_none())
        }
        Actor::Admin(_) => true,
    }
}

fn status_rank(status: RideStatus) -> usize {
    RideStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(usize::MAX)
}

fn compare(a: &Ride, b: &Ride, field: SortField) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => a.requested_at().cmp(&b.requested_at()),
        SortField::Status => status_rank(a.status()).cmp(&status_rank(b.status())),
        SortField::Fare => a.fare().cmp(&b.fare()),
    };
    primary
        .then_with(|| a.requested_at().cmp(&b.requested_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("ride {id} not found"))
}

// -- Router -------------------------------------------------------------------

/// Build the rides router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/rides", get(list_rides).post(request_ride))
        .route("/v1/rides/:id", get(get_ride))
        .route("/v1/rides/:id/actions", get(ride_actions))
        .route("/v1/rides/:id/accept", patch(accept_ride))
        .route("/v1/rides/:id/cancel", patch(cancel_ride))
        .route("/v1/rides/:id/pickup", patch(pickup_ride))
        .route("/v1/rides/:id/transit", patch(transit_ride))
        .route("/v1/rides/:id/complete", patch(complete_ride))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/rides — Request a ride.
///
/// The fare is quoted by the configured calculator. A rider may hold at
/// most one active ride.
#[utoipa::path(
    post,
    path = "/v1/rides",
    request_body = RequestRideBody,
    responses(
        (status = 201, description = "Ride requested"),
        (status = 403, description = "Caller is not a rider", body = crate::error::ErrorBody),
        (status = 409, description = "Rider already has an active ride", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid coordinates", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn request_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RequestRideBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Ride>), AppError> {
    let req = extract_validated_json(body)?;
    let pickup = GeoPoint::try_from(req.pickup_location)?;
    let destination = GeoPoint::try_from(req.destination_location)?;

    let fare = state.fares.quote(&pickup, &destination);

    state.rides.with_write(|rides| -> Result<_, AppError> {
        if let Some(active) = rides
            .values()
            .find(|r| caller.actor.rider_id() == Some(r.rider_id()) && !r.is_terminal())
        {
            tracing::warn!(actor = %caller.actor, active_ride = %active.id(), "ride request rejected: rider has an active ride");
            return Err(AppError::Conflict(format!(
                "rider already has an active ride {} in status {}",
                active.id(),
                active.status()
            )));
        }
        let ride = Ride::request(&caller.actor, pickup, destination, fare)?;
        rides.insert(*ride.id().as_uuid(), ride.clone());
        Ok((StatusCode::CREATED, Json(ride)))
    })
}

/// GET /v1/rides — List rides visible to the caller.
#[utoipa::path(
    get,
    path = "/v1/rides",
    params(ListRidesQuery),
    responses(
        (status = 200, description = "One page of rides with pagination metadata"),
        (status = 422, description = "Invalid pagination", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn list_rides(
    State(state): State<AppState>,
    caller: CallerIdentity,
    query: Result<Query<ListRidesQuery>, QueryRejection>,
) -> Result<Json<RidePage>, AppError> {
    let query = extract_validated_query(query)?;
    let page = query.effective_page();
    let limit = query.effective_limit();
    let field = query.sort.unwrap_or_default();
    let order = query.order.unwrap_or_default();

    let mut rides = state.rides.list_where(|ride| {
        listed_for(ride, &caller.actor) && query.status.map_or(true, |s| ride.status() == s)
    });
    rides.sort_by(|a, b| match order {
        SortOrder::Asc => compare(a, b, field),
        SortOrder::Desc => compare(b, a, field),
    });

    let total_docs = rides.len();
    let total_pages = total_docs.div_ceil(limit);
    let data = rides
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Ok(Json(RidePage {
        data,
        meta: PageMeta {
            page,
            limit,
            total_docs,
            total_pages,
        },
    }))
}

/// GET /v1/rides/:id — Ride details, including all timestamps.
#[utoipa::path(
    get,
    path = "/v1/rides/{id}",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride found"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn get_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    let id = extract_path(path)?;
    state
        .rides
        .get(&id)
        .filter(|ride| readable_by(ride, &caller.actor))
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// GET /v1/rides/:id/actions — The caller's lifecycle view of a ride.
#[utoipa::path(
    get,
    path = "/v1/rides/{id}/actions",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Stepper position, badge and permitted operations"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn ride_actions(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LifecycleView>, AppError> {
    let id = extract_path(path)?;
    let ride = state
        .rides
        .get(&id)
        .filter(|ride| readable_by(ride, &caller.actor))
        .ok_or_else(|| not_found(id))?;
    Ok(Json(LifecycleView::for_viewer(&ride, &caller.actor)))
}

/// Apply `operation` to ride `id` atomically.
fn transition(
    state: &AppState,
    caller: &CallerIdentity,
    id: Uuid,
    operation: RideOperation,
) -> Result<Json<Ride>, AppError> {
    let actor = caller.actor;
    state.rides.with_write(|rides| -> Result<Json<Ride>, AppError> {
        let current = rides.get(&id).ok_or_else(|| not_found(id))?;
        if let Err(err) = current.check(&actor, operation) {
            tracing::warn!(ride_id = %id, %operation, actor = %actor, status = %current.status(), error = %err, "ride transition rejected");
            return Err(err.into());
        }

        if let (RideOperation::Accept, Some(driver)) = (operation, actor.driver_id()) {
            if let Some(active) = rides
                .values()
                .find(|r| r.is_bound_driver(driver) && !r.is_terminal())
            {
                tracing::warn!(ride_id = %id, actor = %actor, active_ride = %active.id(), "accept rejected: driver has an active ride");
                return Err(AppError::Conflict(format!(
                    "driver is already bound to active ride {}",
                    active.id()
                )));
            }
        }

        let ride = rides.get_mut(&id).ok_or_else(|| not_found(id))?;
        ride.apply(operation, &actor)?;
        Ok(Json(ride.clone()))
    })
}

/// PATCH /v1/rides/:id/accept — Accept a requested ride (driver).
#[utoipa::path(
    patch,
    path = "/v1/rides/{id}/accept",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride accepted; driver bound"),
        (status = 403, description = "Caller is not a driver", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ride not REQUESTED, or driver already busy", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn accept_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    transition(&state, &caller, extract_path(path)?, RideOperation::Accept)
}

/// PATCH /v1/rides/:id/cancel — Cancel before pickup.
#[utoipa::path(
    patch,
    path = "/v1/rides/{id}/cancel",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride cancelled; canceller recorded"),
        (status = 403, description = "Caller may not cancel this ride", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Cancellation window closed", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn cancel_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    transition(&state, &caller, extract_path(path)?, RideOperation::Cancel)
}

/// PATCH /v1/rides/:id/pickup — Collect the rider (bound driver).
#[utoipa::path(
    patch,
    path = "/v1/rides/{id}/pickup",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Rider picked up"),
        (status = 403, description = "Caller is not the bound driver", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ride not ACCEPTED", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn pickup_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    transition(&state, &caller, extract_path(path)?, RideOperation::Pickup)
}

/// PATCH /v1/rides/:id/transit — Start the journey (bound driver).
#[utoipa::path(
    patch,
    path = "/v1/rides/{id}/transit",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride in transit"),
        (status = 403, description = "Caller is not the bound driver", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ride not PICKED_UP", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn transit_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    transition(&state, &caller, extract_path(path)?, RideOperation::Transit)
}

/// PATCH /v1/rides/:id/complete — Finish the journey (bound driver).
#[utoipa::path(
    patch,
    path = "/v1/rides/{id}/complete",
    params(("id" = Uuid, Path, description = "Ride ID")),
    responses(
        (status = 200, description = "Ride completed"),
        (status = 403, description = "Caller is not the bound driver", body = crate::error::ErrorBody),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Ride not IN_TRANSIT", body = crate::error::ErrorBody),
    ),
    tag = "rides"
)]
pub async fn complete_ride(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Ride>, AppError> {
    transition(&state, &caller, extract_path(path)?, RideOperation::Complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ride_core::{DriverId, Fare, RiderId};

    fn ride_for(rider: RiderId) -> Ride {
        let a = GeoPoint::new(1.0, 1.0).unwrap();
        let b = GeoPoint::new(1.0, 1.1).unwrap();
        Ride::request(&Actor::Rider(rider), a, b, Fare::from_cents(400)).unwrap()
    }

    #[test]
    fn riders_only_read_their_own_rides() {
        let owner = RiderId::new();
        let ride = ride_for(owner);
        assert!(readable_by(&ride, &Actor::Rider(owner)));
        assert!(!readable_by(&ride, &Actor::Rider(RiderId::new())));
        assert!(readable_by(&ride, &Actor::Driver(DriverId::new())));
    }

    #[test]
    fn drivers_only_read_open_or_bound_rides() {
        let mut ride = ride_for(RiderId::new());
        let mine = DriverId::new();
        let other = DriverId::new();
        ride.accept(&Actor::Driver(mine)).unwrap();

        assert!(readable_by(&ride, &Actor::Driver(mine)));
        assert!(!readable_by(&ride, &Actor::Driver(other)));
        assert!(readable_by(&ride, &Actor::Admin(ride_core::AdminId::new())));

        ride.cancel(&Actor::Driver(mine)).unwrap();
        assert!(readable_by(&ride, &Actor::Driver(mine)));
        assert!(!readable_by(&ride, &Actor::Driver(other)));
    }

    #[test]
    fn drivers_list_open_requests_and_their_own() {
        let mut ride = ride_for(RiderId::new());
        let mine = DriverId::new();
        let other = DriverId::new();
        assert!(listed_for(&ride, &Actor::Driver(other)));

        ride.accept(&Actor::Driver(mine)).unwrap();
        assert!(listed_for(&ride, &Actor::Driver(mine)));
        assert!(!listed_for(&ride, &Actor::Driver(other)));
    }

    #[test]
    fn list_query_defaults_and_clamps() {
        let query = ListRidesQuery::default();
        assert_eq!(query.effective_page(), 1);
        assert_eq!(query.effective_limit(), 10);
        let query = ListRidesQuery {
            limit: Some(5000),
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 100);
        let query = ListRidesQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn request_body_rejects_out_of_range_and_identical_points() {
        let body = RequestRideBody {
            pickup_location: Coordinates {
                latitude: 91.0,
                longitude: 0.0,
            },
            destination_location: Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
        };
        assert!(body.validate().unwrap_err().contains("pickup_location"));

        let same = Coordinates {
            latitude: 10.0,
            longitude: 10.0,
        };
        let body = RequestRideBody {
            pickup_location: same,
            destination_location: same,
        };
        assert!(body.validate().unwrap_err().contains("must differ"));
    }

    #[test]
    fn status_sort_follows_lifecycle_order() {
        assert!(status_rank(RideStatus::Requested) < status_rank(RideStatus::Completed));
    }
}
