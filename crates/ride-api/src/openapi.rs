//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented ride routes into one OpenAPI document
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ride Lifecycle API",
        version = "0.1.0",
        description = "Service of record for rides: request, accept, cancel, pickup, transit and complete, with role-scoped reads.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::rides::request_ride,
        crate::routes::rides::list_rides,
        crate::routes::rides::get_ride,
        crate::routes::rides::ride_actions,
        crate::routes::rides::accept_ride,
        crate::routes::rides::cancel_ride,
        crate::routes::rides::pickup_ride,
        crate::routes::rides::transit_ride,
        crate::routes::rides::complete_ride,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::rides::Coordinates,
        crate::routes::rides::RequestRideBody,
        crate::routes::rides::SortField,
        crate::routes::rides::SortOrder,
        crate::routes::rides::PageMeta,
    )),
    tags(
        (name = "rides", description = "Ride lifecycle"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_ride_path() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/v1/rides",
            "/v1/rides/{id}",
            "/v1/rides/{id}/actions",
            "/v1/rides/{id}/accept",
            "/v1/rides/{id}/cancel",
            "/v1/rides/{id}/pickup",
            "/v1/rides/{id}/transit",
            "/v1/rides/{id}/complete",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {expected}"
            );
        }
    }
}
