use std::f64::consts::PI;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

/// Potholes carry no identity beyond their coordinate.
pub type Pothole = Point;

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Great-circle distance to `other` in meters (haversine).
    pub fn distance_m(&self, other: &Point) -> f64 {
        let d2r = PI / 180.0;
        let (phi1, phi2) = (self.latitude * d2r, other.latitude * d2r);
        let dphi = (other.latitude - self.latitude) * d2r;
        let dlambda = (other.longitude - self.longitude) * d2r;
        let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}
