//! Geographic math
//!
//! This module holds everything that maps between the earth and the screen:
//! - Latitude/longitude to sphere positions and back (convert.rs)
//! - The orbiting perspective camera used by the globe view (camera.rs)

pub mod camera;
pub mod convert;

pub use camera::OrbitCamera;
pub use convert::{to_cartesian, to_geographic, GeoPoint, Vec3};
