//! Fare quoting for new rides.
//!
//! The lifecycle treats the fare as an opaque input attached at creation.
//! [`FareCalculator`] is the seam through which the service obtains it.

use ride_core::{Fare, GeoPoint};

/// Base fare in cents.
pub const DEFAULT_BASE_FARE_CENTS: u64 = 250;

/// Per-kilometre rate in cents.
pub const DEFAULT_PER_KM_CENTS: u64 = 150;

/// Quotes a fare for a trip.
pub trait FareCalculator: Send + Sync + std::fmt::Debug {
    fn quote(&self, pickup: &GeoPoint, destination: &GeoPoint) -> Fare;
}

/// `base + per_km × great-circle distance`, rounded to the nearest cent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceFareCalculator {
    pub base_cents: u64,
    pub per_km_cents: u64,
}

impl Default for DistanceFareCalculator {
    fn default() -> Self {
        Self {
            base_cents: DEFAULT_BASE_FARE_CENTS,
            per_km_cents: DEFAULT_PER_KM_CENTS,
        }
    }
}

impl FareCalculator for DistanceFareCalculator {
    fn quote(&self, pickup: &GeoPoint, destination: &GeoPoint) -> Fare {
        let distance_km = pickup.distance_km(destination);
        let variable = (distance_km * self.per_km_cents as f64).round() as u64;
        Fare::from_cents(self.base_cents).saturating_add(Fare::from_cents(variable))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_point_costs_base_fare() {
        let p = GeoPoint::new(23.8103, 90.4125).unwrap();
        let fare = DistanceFareCalculator::default().quote(&p, &p);
        assert_eq!(fare.cents(), DEFAULT_BASE_FARE_CENTS);
    }

    #[test]
    fn fare_grows_with_distance() {
        let calc = DistanceFareCalculator::default();
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let near = GeoPoint::new(0.0, 0.01).unwrap();
        let far = GeoPoint::new(0.0, 0.1).unwrap();
        assert!(calc.quote(&a, &near) < calc.quote(&a, &far));
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        // ~111.19 km at the equator.
        let calc = DistanceFareCalculator {
            base_cents: 0,
            per_km_cents: 100,
        };
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let cents = calc.quote(&a, &b).cents();
        assert!((11_100..=11_140).contains(&cents), "got {cents}");
    }
}
