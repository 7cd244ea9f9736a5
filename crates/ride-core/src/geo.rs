//! # Coordinates
//!
//! A validated WGS84 coordinate pair. Pickup and destination of a ride are
//! stored as [`GeoPoint`]s; geocoding and map rendering live elsewhere.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Deserialization runs the same validation as [`GeoPoint::new`], so an
/// out-of-range coordinate in a request body is rejected before it reaches
/// the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a validated coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLatitude`] or
    /// [`ValidationError::InvalidLongitude`] for non-finite or out-of-range
    /// values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle (haversine) distance to `other` in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl std::str::FromStr for GeoPoint {
    type Err = ValidationError;

    /// Parse `"lat,lon"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::InvalidCoordinate(s.to_string());
        let (lat, lon) = s.split_once(',').ok_or_else(malformed)?;
        let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let lon: f64 = lon.trim().parse().map_err(|_| malformed())?;
        GeoPoint::new(lat, lon)
    }
}
