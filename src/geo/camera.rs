//! Orbit camera for the globe view
//!
//! The camera always looks at the origin (the globe's centre) from a point on
//! a sphere of radius `distance`, parameterised by yaw and pitch. Dragging
//! changes yaw/pitch, scrolling changes distance, and a released drag keeps
//! coasting with damping until it settles.

use cgmath::{perspective, Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};
use std::f64::consts::FRAC_PI_2;

use super::convert::Vec3;

const FOV_Y_DEGREES: f64 = 75.0;
const NEAR: f64 = 0.1;
const FAR: f64 = 1000.0;

const ORBIT_SENSITIVITY: f64 = 0.005;
const ZOOM_SENSITIVITY: f64 = 0.15;
const MIN_DISTANCE: f64 = 1.2;
const MAX_DISTANCE: f64 = 10.0;
const MIN_PITCH: f64 = -FRAC_PI_2 + 0.05;
const MAX_PITCH: f64 = FRAC_PI_2 - 0.05;

/// Fraction of angular velocity lost per frame after a drag is released
const DAMPING_FACTOR: f64 = 0.25;
/// Coasting stops once both velocities drop below this (radians per frame)
const REST_VELOCITY: f64 = 1e-4;

/// Size of the surface the camera renders into, in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// A world point after projection to screen space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    yaw: f64,
    pitch: f64,
    distance: f64,
    yaw_velocity: f64,
    pitch_velocity: f64,
    dragging: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 2.0,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            dragging: false,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera position in world space
    pub fn eye(&self) -> Point3<f64> {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();

        Point3::new(
            self.distance * cos_pitch * sin_yaw,
            self.distance * sin_pitch,
            self.distance * cos_pitch * cos_yaw,
        )
    }

    pub fn view_projection(&self, viewport: Viewport) -> Matrix4<f64> {
        let projection = perspective(Deg(FOV_Y_DEGREES), viewport.aspect(), NEAR, FAR);
        let view = Matrix4::look_at_rh(self.eye(), Point3::origin(), Vector3::unit_y());
        projection * view
    }

    /// Project a world point to screen space
    ///
    /// Returns `None` when the point is behind the viewpoint or past the far
    /// plane, i.e. whenever a label for it must be hidden.
    pub fn project(&self, point: Vec3, viewport: Viewport) -> Option<Projected> {
        let clip = self.view_projection(viewport) * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }

        let ndc = clip.truncate() / clip.w;
        if ndc.z > 1.0 {
            return None;
        }

        Some(Projected {
            x: (ndc.x + 1.0) * 0.5 * viewport.width,
            y: (1.0 - ndc.y) * 0.5 * viewport.height,
        })
    }

    /// Whether a point on (or just above) a sphere of `radius` is on the
    /// hemisphere facing the camera
    pub fn faces_camera(&self, point: Vec3, radius: f64) -> bool {
        if point.magnitude2() == 0.0 {
            return false;
        }
        point.normalize().dot(self.eye().to_vec()) >= radius
    }

    /// Screen-space circle covered by a sphere of `radius` at the origin
    ///
    /// Returns centre x, centre y and radius in pixels.
    pub fn sphere_silhouette(&self, viewport: Viewport, radius: f64) -> Option<(f64, f64, f64)> {
        if self.distance <= radius {
            return None;
        }
        let centre = self.project(Vec3::new(0.0, 0.0, 0.0), viewport)?;
        let angular_radius = (radius / self.distance).asin();
        let half_fov = (FOV_Y_DEGREES * 0.5).to_radians();
        let pixels = angular_radius.tan() / half_fov.tan() * viewport.height * 0.5;

        Some((centre.x, centre.y, pixels))
    }

    /// Cast a ray through a screen position and intersect it with a sphere of
    /// `radius` at the origin, returning the nearest hit
    pub fn pick_sphere(&self, x: f64, y: f64, viewport: Viewport, radius: f64) -> Option<Vec3> {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return None;
        }

        let ndc_x = x / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - y / viewport.height * 2.0;

        let inverse = self.view_projection(viewport).invert()?;
        let unproject = |z: f64| {
            let world = inverse * Vec3::new(ndc_x, ndc_y, z).extend(1.0);
            if world.w.abs() < f64::EPSILON {
                None
            } else {
                Some(world.truncate() / world.w)
            }
        };

        let near = unproject(-1.0)?;
        let far = unproject(1.0)?;
        ray_sphere_intersection(near, (far - near).normalize(), radius)
    }

    /// Start of a drag: stop any coasting
    pub fn grab(&mut self) {
        self.dragging = true;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
    }

    /// Apply a drag delta in pixels
    pub fn orbit(&mut self, dx: f64, dy: f64) {
        let yaw_delta = -dx * ORBIT_SENSITIVITY;
        let pitch_delta = dy * ORBIT_SENSITIVITY;

        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(MIN_PITCH, MAX_PITCH);
        self.yaw_velocity = yaw_delta;
        self.pitch_velocity = pitch_delta;
    }

    /// End of a drag: keep the last velocity and let it decay
    pub fn release(&mut self) {
        self.dragging = false;
    }

    pub fn zoom(&mut self, delta: f64) {
        self.distance = (self.distance - delta * ZOOM_SENSITIVITY).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// True while a released drag is still moving the camera
    pub fn is_coasting(&self) -> bool {
        !self.dragging
            && (self.yaw_velocity.abs() > REST_VELOCITY || self.pitch_velocity.abs() > REST_VELOCITY)
    }

    /// Advance one animation frame; returns whether the camera is still coasting
    pub fn tick(&mut self) -> bool {
        if !self.is_coasting() {
            self.yaw_velocity = 0.0;
            self.pitch_velocity = 0.0;
            return false;
        }

        self.yaw += self.yaw_velocity;
        self.pitch = (self.pitch + self.pitch_velocity).clamp(MIN_PITCH, MAX_PITCH);
        self.yaw_velocity *= 1.0 - DAMPING_FACTOR;
        self.pitch_velocity *= 1.0 - DAMPING_FACTOR;

        self.is_coasting()
    }
}

/// Nearest non-negative intersection of a ray with an origin-centred sphere
fn ray_sphere_intersection(origin: Vec3, direction: Vec3, radius: f64) -> Option<Vec3> {
    let b = origin.dot(direction);
    let c = origin.magnitude2() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let t = if -b - root >= 0.0 { -b - root } else { -b + root };
    if t < 0.0 {
        return None;
    }

    Some(origin + direction * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::convert::{to_cartesian, to_geographic};

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn test_origin_projects_to_centre() {
        let camera = OrbitCamera::new();
        let p = camera.project(Vec3::new(0.0, 0.0, 0.0), viewport()).unwrap();
        assert_close(p.x, 400.0, 1e-6);
        assert_close(p.y, 300.0, 1e-6);
    }

    #[test]
    fn test_point_behind_camera_is_hidden() {
        let camera = OrbitCamera::new();
        assert!(camera.project(Vec3::new(0.0, 0.0, 5.0), viewport()).is_none());
    }

    #[test]
    fn test_far_hemisphere_does_not_face_camera() {
        let camera = OrbitCamera::new();
        assert!(camera.faces_camera(Vec3::new(0.0, 0.0, 1.02), 1.0));
        assert!(!camera.faces_camera(Vec3::new(0.0, 0.0, -1.02), 1.0));
    }

    #[test]
    fn test_pick_centre_hits_facing_point() {
        let camera = OrbitCamera::new();
        let hit = camera.pick_sphere(400.0, 300.0, viewport(), 1.0).unwrap();
        assert_close(hit.x, 0.0, 1e-6);
        assert_close(hit.y, 0.0, 1e-6);
        assert_close(hit.z, 1.0, 1e-6);

        let geo = to_geographic(hit);
        assert_close(geo.lat, 0.0, 1e-6);
        assert_close(geo.lng, -90.0, 1e-6);
    }

    #[test]
    fn test_pick_outside_globe_misses() {
        let camera = OrbitCamera::new();
        assert!(camera.pick_sphere(2.0, 2.0, viewport(), 1.0).is_none());
    }

    #[test]
    fn test_pick_inverts_projection() {
        let mut camera = OrbitCamera::new();
        camera.orbit(120.0, -40.0);

        let target = to_cartesian(35.0, camera_facing_lng(&camera), 1.0);
        let projected = camera.project(target, viewport()).unwrap();
        let hit = camera.pick_sphere(projected.x, projected.y, viewport(), 1.0).unwrap();
        assert_close((hit - target).magnitude(), 0.0, 1e-6);
    }

    fn camera_facing_lng(camera: &OrbitCamera) -> f64 {
        to_geographic(camera.eye().to_vec()).lng
    }

    #[test]
    fn test_silhouette_is_centred() {
        let camera = OrbitCamera::new();
        let (x, y, r) = camera.sphere_silhouette(viewport(), 1.0).unwrap();
        assert_close(x, 400.0, 1e-6);
        assert_close(y, 300.0, 1e-6);
        assert!(r > 0.0 && r < 300.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = OrbitCamera::new();
        camera.zoom(1000.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_release_coasts_then_settles() {
        let mut camera = OrbitCamera::new();
        camera.grab();
        camera.orbit(30.0, 0.0);
        assert!(!camera.is_coasting());

        camera.release();
        assert!(camera.is_coasting());

        let before = camera.eye();
        let mut frames = 0;
        while camera.tick() {
            frames += 1;
            assert!(frames < 1000, "camera never settled");
        }
        assert_ne!(before, camera.eye());
        assert!(!camera.is_coasting());
    }
}
