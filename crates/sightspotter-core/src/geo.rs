//! Geographic points, great-circle bearing and haversine distance
//!
//! All angles at this API boundary are in degrees. A spherical Earth model is
//! used throughout; ellipsoidal corrections are not applied.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    #[error("Latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("Longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// A point on the Earth's surface in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a validated point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    /// Check the latitude/longitude ranges. NaN is rejected.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }

    /// Initial great-circle bearing from this point towards `other`
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        bearing(*self, *other)
    }

    /// Haversine distance to `other` in metres
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(*self, *other)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

pub fn rad_to_deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Compass bearing in degrees [0, 360) from `from` towards `to`.
///
/// Uses the standard great-circle initial bearing:
/// `atan2(sin Δλ · cos φ2, cos φ1 · sin φ2 − sin φ1 · cos φ2 · cos Δλ)`.
/// Identical points yield `atan2(0, 0) = 0`.
pub fn bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat_from = deg_to_rad(from.latitude);
    let lat_to = deg_to_rad(to.latitude);
    let delta_lon = deg_to_rad(to.longitude - from.longitude);

    let y = delta_lon.sin() * lat_to.cos();
    let x = lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * delta_lon.cos();

    normalize_degrees(rad_to_deg(y.atan2(x)))
}

/// Great-circle ground distance in metres
pub fn haversine_distance(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat_from = deg_to_rad(from.latitude);
    let lat_to = deg_to_rad(to.latitude);
    let delta_lat = deg_to_rad(to.latitude - from.latitude);
    let delta_lon = deg_to_rad(to.longitude - from.longitude);

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat_from.cos() * lat_to.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_bearing_same_point_is_finite() {
        let p = pt(51.5, -0.12);
        let b = bearing(p, p);
        assert!(b.is_finite());
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_bearing_due_north() {
        let b = bearing(pt(0.0, 0.0), pt(1.0, 0.0));
        assert!(b.abs() < EPS, "bearing was {}", b);
    }

    #[test]
    fn test_bearing_due_east() {
        let b = bearing(pt(0.0, 0.0), pt(0.0, 1.0));
        assert!((b - 90.0).abs() < EPS, "bearing was {}", b);
    }

    #[test]
    fn test_bearing_due_south_and_west() {
        let south = bearing(pt(0.0, 0.0), pt(-1.0, 0.0));
        assert!((south - 180.0).abs() < EPS, "bearing was {}", south);

        let west = bearing(pt(0.0, 0.0), pt(0.0, -1.0));
        assert!((west - 270.0).abs() < EPS, "bearing was {}", west);
    }

    #[test]
    fn test_bearing_uses_target_latitude() {
        // At high latitude the cos(lat_to) term dominates the east component.
        let from = pt(60.0, 10.0);
        let to = pt(60.5, 11.0);
        let b = bearing(from, to);
        let lat_to = 60.5_f64.to_radians();
        let lat_from = 60.0_f64.to_radians();
        let dl = 1.0_f64.to_radians();
        let expected = (dl.sin() * lat_to.cos())
            .atan2(lat_from.cos() * lat_to.sin() - lat_from.sin() * lat_to.cos() * dl.cos())
            .to_degrees();
        assert!((b - expected).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert!((normalize_degrees(-90.0) - 270.0).abs() < 1e-12);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-12);
        assert!(normalize_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_haversine_one_degree_of_longitude_at_equator() {
        let d = haversine_distance(pt(0.0, 0.0), pt(0.0, 1.0));
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-6);
        assert_eq!(haversine_distance(pt(10.0, 10.0), pt(10.0, 10.0)), 0.0);
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert_eq!(
            GeoPoint::new(91.0, 0.0),
            Err(GeoError::InvalidLatitude(91.0))
        );
        assert_eq!(
            GeoPoint::new(0.0, -181.0),
            Err(GeoError::InvalidLongitude(-181.0))
        );
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }
}
