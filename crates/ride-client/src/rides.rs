//! Typed client for the ride lifecycle API.
//!
//! | Method | Path                         | Operation        |
//! |--------|------------------------------|------------------|
//! | POST   | `/v1/rides`                  | Request a ride   |
//! | GET    | `/v1/rides`                  | List rides       |
//! | GET    | `/v1/rides/{id}`             | Ride details     |
//! | GET    | `/v1/rides/{id}/actions`     | Lifecycle view   |
//! | PATCH  | `/v1/rides/{id}/{operation}` | Apply transition |
//!
//! Every ride record received is checked with [`Ride::verify`] before it
//! is handed to the caller. Reads retry transient failures; transitions
//! and creation are sent exactly once.

use std::time::Duration;

use ride_core::{GeoPoint, RideId};
use ride_state::{LifecycleView, Ride, RideOperation, RideStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigError, RideClientConfig};
use crate::error::RideClientError;
use crate::retry::retry_read;

const RIDES_PATH: &str = "v1/rides";

// -- Request/Response types matching the ride API schemas ---------------------

#[derive(Debug, Serialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl From<&GeoPoint> for Coordinates {
    fn from(p: &GeoPoint) -> Self {
        Self {
            latitude: p.latitude(),
            longitude: p.longitude(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestRideBody {
    pickup_location: Coordinates,
    destination_location: Coordinates,
}

/// Sort key for ride listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    Status,
    Fare,
}

/// Sort direction for ride listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query parameters for `GET /v1/rides`. Unset fields use server defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListRidesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RideStatus>,
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
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

// -- Client -------------------------------------------------------------------

/// HTTP client for the ride API, authenticated as a single actor.
#[derive(Debug, Clone)]
pub struct RideClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RideClient {
    /// Build a client from configuration.
    pub fn new(config: RideClientConfig) -> Result<Self, RideClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!(
            "Bearer {}",
            config.api_token.as_str()
        ))
        .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RideClientError::transport("client_init", e))?;

        Ok(Self {
            http,
            base_url: config.api_url,
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            RIDES_PATH,
            suffix
        )
    }

    /// `POST /v1/rides`. Sent once; a transient failure leaves the outcome
    /// unknown.
    pub async fn request_ride(
        &self,
        pickup: &GeoPoint,
        destination: &GeoPoint,
    ) -> Result<Ride, RideClientError> {
        let endpoint = "POST /v1/rides";
        let body = RequestRideBody {
            pickup_location: pickup.into(),
            destination_location: destination.into(),
        };
        let ride: Ride = self
            .send(endpoint, self.http.post(self.url("")).json(&body))
            .await?;
        ride.verify()?;
        Ok(ride)
    }

    /// `PATCH /v1/rides/{id}/{operation}`. Sent once.
    pub async fn perform(
        &self,
        ride_id: RideId,
        operation: RideOperation,
    ) -> Result<Ride, RideClientError> {
        if operation == RideOperation::Request {
            return Err(RideClientError::NotATransition(operation));
        }
        let endpoint = format!("PATCH /v1/rides/{{id}}/{}", operation.as_str());
        let url = self.url(&format!("/{ride_id}/{}", operation.as_str()));
        tracing::debug!(ride_id = %ride_id, %operation, "sending ride transition");
        let ride: Ride = self.send(&endpoint, self.http.patch(url)).await?;
        ride.verify()?;
        Ok(ride)
    }

    pub async fn accept_ride(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        self.perform(ride_id, RideOperation::Accept).await
    }

    pub async fn cancel_ride(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        self.perform(ride_id, RideOperation::Cancel).await
    }

    pub async fn pickup_ride(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        self.perform(ride_id, RideOperation::Pickup).await
    }

    pub async fn transit_ride(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        self.perform(ride_id, RideOperation::Transit).await
    }

    pub async fn complete_ride(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        self.perform(ride_id, RideOperation::Complete).await
    }

    /// `GET /v1/rides/{id}`, retried on transient failure.
    pub async fn get_ride_details(&self, ride_id: RideId) -> Result<Ride, RideClientError> {
        let endpoint = "GET /v1/rides/{id}";
        let url = self.url(&format!("/{ride_id}"));
        let ride: Ride = retry_read(endpoint, move || {
            self.send(endpoint, self.http.get(url.clone()))
        })
        .await?;
        ride.verify()?;
        Ok(ride)
    }

    /// `GET /v1/rides`, retried on transient failure.
    pub async fn get_all_rides(
        &self,
        params: &ListRidesParams,
    ) -> Result<RidePage, RideClientError> {
        let endpoint = "GET /v1/rides";
        let url = self.url("");
        let page: RidePage = retry_read(endpoint, move || {
            self.send(endpoint, self.http.get(url.clone()).query(params))
        })
        .await?;
        for ride in &page.data {
            ride.verify()?;
        }
        Ok(page)
    }

    /// `GET /v1/rides/{id}/actions`, retried on transient failure.
    pub async fn ride_actions(&self, ride_id: RideId) -> Result<LifecycleView, RideClientError> {
        let endpoint = "GET /v1/rides/{id}/actions";
        let url = self.url(&format!("/{ride_id}/actions"));
        retry_read(endpoint, move || {
            self.send(endpoint, self.http.get(url.clone()))
        })
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RideClientError> {
        let resp = request
            .send()
            .await
            .map_err(|e| RideClientError::transport(endpoint, e))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| RideClientError::transport(endpoint, e))?;

        if !status.is_success() {
            return Err(RideClientError::from_response(
                endpoint,
                status.as_u16(),
                &String::from_utf8_lossy(&bytes),
            ));
        }

        serde_json::from_slice(&bytes).map_err(|source| RideClientError::Deserialization {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
