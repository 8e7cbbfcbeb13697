//! Geographic point values and distance, supplemented from the original's
//! `src/datatypes/point.c`.

use serde::{Deserialize, Serialize};

/// A point on the earth's surface, stored as decimal-degree lat/lon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance between two points, in meters, via the haversine
/// formula — matching the original's `distance()` procedure used in index
/// push-down for predicates like `distance(n.loc, origin) < radius`.
pub fn distance(a: Point, b: Point) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Point::new(51.5, -0.1);
        assert!(distance(p, p) < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point::new(40.7128, -74.0060);
        let b = Point::new(51.5074, -0.1278);
        assert!((distance(a, b) - distance(b, a)).abs() < 1e-6);
    }

    #[test]
    fn known_distance_is_approximately_correct() {
        // New York to London is roughly 5570km.
        let ny = Point::new(40.7128, -74.0060);
        let london = Point::new(51.5074, -0.1278);
        let d_km = distance(ny, london) / 1000.0;
        assert!((5500.0..5650.0).contains(&d_km), "got {d_km} km");
    }
}
