//! Module with GPS specific structures and distance math

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers, used by the haversine formula
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Stores a single geospatial point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// latitude coordinate in degrees
    lat: f64,
    /// longitude coordinate in degrees
    lng: f64,
}

impl GeoPoint {
    /// Create a point from coordinates provided in degrees
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }

    /// Return latitude in degrees
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Return longitude in degrees
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Great-circle distance between two points in kilometers (haversine formula).
///
/// Straight-line only; used for route-card annotations and shift summary
/// totals, not for navigation.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    (EARTH_RADIUS_KM * c).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_zero_for_coincident_points() {
        let p = GeoPoint::new(42.6977, 23.3219);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let sofia = GeoPoint::new(42.6977, 23.3219);
        let plovdiv = GeoPoint::new(42.1354, 24.7453);
        let there = distance_km(sofia, plovdiv);
        let back = distance_km(plovdiv, sofia);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn sofia_to_plovdiv_is_about_135_km() {
        let sofia = GeoPoint::new(42.6977, 23.3219);
        let plovdiv = GeoPoint::new(42.1354, 24.7453);
        let d = distance_km(sofia, plovdiv);
        assert!(d > 130.0 && d < 140.0, "got {} km", d);
    }
}
