//! Coordinate conversion between geographic and Cartesian space
//!
//! Axis convention (Y-up, right-handed, same frame as the globe camera):
//! - +Y points to the north pole
//! - +X points to (0°, 0°)
//! - -Z points to (0°, 90°E)
//!
//! Flipping the longitude sign on Z keeps east to the right of west when the
//! globe is seen from outside. `to_geographic` applies the same flip, so the
//! two functions are exact inverses of each other.

use cgmath::{InnerSpace, Vector3};

pub type Vec3 = Vector3<f64>;

/// Below this radius a point is treated as the origin
const MIN_RADIUS: f64 = 1e-12;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}, {:.2}", self.lat, self.lng)
    }
}

/// Place a geographic coordinate on a sphere of the given radius
pub fn to_cartesian(lat: f64, lng: f64, radius: f64) -> Vec3 {
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lng, cos_lng) = lng.to_radians().sin_cos();

    Vec3::new(
        radius * cos_lat * cos_lng,
        radius * sin_lat,
        -radius * cos_lat * sin_lng,
    )
}

/// Recover latitude/longitude from a point at any distance from the origin
///
/// The point is normalised by its own radius. At the poles longitude is
/// undefined and comes back as 0; the origin maps to (0, 0).
pub fn to_geographic(point: Vec3) -> GeoPoint {
    let radius = point.magnitude();
    if radius < MIN_RADIUS {
        return GeoPoint::new(0.0, 0.0);
    }

    let lat = (point.y / radius).clamp(-1.0, 1.0).asin().to_degrees();

    let horizontal = (point.x * point.x + point.z * point.z).sqrt();
    let lng = if horizontal < MIN_RADIUS * radius {
        0.0
    } else {
        (-point.z).atan2(point.x).to_degrees()
    };

    GeoPoint::new(lat, lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn test_prime_meridian_on_equator() {
        let p = to_cartesian(0.0, 0.0, 1.0);
        assert_close(p.x, 1.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, 0.0, 1e-12);
    }

    #[test]
    fn test_east_is_negative_z() {
        let p = to_cartesian(0.0, 90.0, 2.0);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.z, -2.0, 1e-12);
    }

    #[test]
    fn test_north_pole_is_up() {
        let p = to_cartesian(90.0, 45.0, 1.5);
        assert_close(p.y, 1.5, 1e-12);
        assert_close(p.magnitude(), 1.5, 1e-12);
    }

    #[test]
    fn test_round_trip() {
        for lat in (-89..=89).step_by(7) {
            for lng in (-179..=179).step_by(13) {
                let (lat, lng) = (lat as f64 + 0.25, lng as f64 - 0.5);
                let geo = to_geographic(to_cartesian(lat, lng, 1.0));
                assert_close(geo.lat, lat, 1e-6);
                assert_close(geo.lng, lng, 1e-6);
            }
        }
    }

    #[test]
    fn test_inverse_normalises_by_own_radius() {
        let geo = to_geographic(to_cartesian(48.8566, 2.3522, 1.02));
        assert_close(geo.lat, 48.8566, 1e-9);
        assert_close(geo.lng, 2.3522, 1e-9);
    }

    #[test]
    fn test_poles_and_origin_do_not_produce_nan() {
        let north = to_geographic(Vec3::new(0.0, 3.0, 0.0));
        assert_close(north.lat, 90.0, 1e-12);
        assert_eq!(north.lng, 0.0);

        let origin = to_geographic(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(origin, GeoPoint::new(0.0, 0.0));
    }
}
