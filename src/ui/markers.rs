//! Marker layer
//!
//! Markers are derived from the location list and never persisted. The layer
//! is rebuilt wholesale whenever the list changes; the only incremental state
//! is the single temporary selection marker.

use std::time::{Duration, Instant};

use crate::geo::camera::{OrbitCamera, Viewport};
use crate::geo::{to_cartesian, GeoPoint, Vec3};
use crate::state::Location;

/// Radius of the unit globe
pub const GLOBE_RADIUS: f64 = 1.0;
/// Markers float slightly above the surface so they are never z-fighting it
pub const MARKER_RADIUS: f64 = 1.02;

/// Visual stand-in for one stored location
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: String,
    pub date: Option<String>,
    pub notes: Option<String>,
    pub point: GeoPoint,
    /// World position on the globe
    pub position: Vec3,
}

impl Marker {
    fn from_location(location: &Location) -> Self {
        Self {
            label: location.name.clone(),
            date: location.date.map(|d| d.format(crate::state::data::DATE_FORMAT).to_string()),
            notes: location.notes.clone(),
            point: location.point(),
            position: to_cartesian(location.lat, location.lng, MARKER_RADIUS),
        }
    }
}

/// Identifies one temporary marker instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporaryToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryMarker {
    pub token: TemporaryToken,
    pub point: GeoPoint,
    pub position: Vec3,
    pub expires_at: Instant,
}

/// A marker label placed in screen space for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

#[derive(Debug, Default, Clone)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    temporary: Option<TemporaryMarker>,
    next_token: u64,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every marker and build exactly one per location
    pub fn render(&mut self, locations: &[Location]) {
        self.markers.clear();
        self.markers.extend(locations.iter().map(Marker::from_location));
        tracing::debug!(count = self.len(), "markers rebuilt");
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn temporary(&self) -> Option<&TemporaryMarker> {
        self.temporary.as_ref()
    }

    /// Show a short-lived selection marker, replacing any previous one.
    ///
    /// The caller schedules `expire_temporary` with the returned token once
    /// `ttl` has elapsed.
    pub fn add_temporary(&mut self, point: GeoPoint, ttl: Duration) -> TemporaryToken {
        self.add_temporary_at(point, ttl, Instant::now())
    }

    fn add_temporary_at(&mut self, point: GeoPoint, ttl: Duration, now: Instant) -> TemporaryToken {
        self.next_token += 1;
        let token = TemporaryToken(self.next_token);
        self.temporary = Some(TemporaryMarker {
            token,
            point,
            position: to_cartesian(point.lat, point.lng, MARKER_RADIUS),
            expires_at: now + ttl,
        });
        token
    }

    /// Remove the temporary marker if it is still the one `token` names.
    /// Returns whether anything was removed.
    pub fn expire_temporary(&mut self, token: TemporaryToken) -> bool {
        match &self.temporary {
            Some(marker) if marker.token == token => {
                self.temporary = None;
                true
            }
            _ => false,
        }
    }

    /// Remove the temporary marker once its deadline has passed
    pub fn prune_expired(&mut self, now: Instant) -> bool {
        match &self.temporary {
            Some(marker) if marker.expires_at <= now => {
                self.temporary = None;
                true
            }
            _ => false,
        }
    }

    /// Project every marker label to screen space for this frame.
    ///
    /// Labels are hidden when the marker is behind the viewpoint or on the
    /// far side of the globe.
    pub fn project_labels(&self, camera: &OrbitCamera, viewport: Viewport) -> Vec<ScreenLabel> {
        self.markers
            .iter()
            .map(|marker| {
                let projected = camera.project(marker.position, viewport);
                let facing = camera.faces_camera(marker.position, GLOBE_RADIUS);
                let (x, y) = projected.map(|p| (p.x, p.y)).unwrap_or((0.0, 0.0));

                ScreenLabel {
                    text: marker.label.clone(),
                    x,
                    y,
                    visible: projected.is_some() && facing,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LocationDraft, ValidationRules};

    fn locations(names: &[(&str, f64, f64)]) -> Vec<Location> {
        names
            .iter()
            .map(|(name, lat, lng)| {
                LocationDraft::new(*name, *lat, *lng)
                    .validate(&ValidationRules::default())
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_render_is_idempotent() {
        let list = locations(&[("Paris", 48.85, 2.35), ("Quito", -0.18, -78.47)]);
        let mut layer = MarkerLayer::new();

        layer.render(&list);
        layer.render(&list);
        assert_eq!(layer.len(), 2);

        layer.render(&list[..1]);
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.markers()[0].label, "Paris");

        layer.render(&[]);
        assert!(layer.markers().is_empty());
    }

    #[test]
    fn test_markers_float_above_globe() {
        let list = locations(&[("Nairobi", -1.29, 36.82)]);
        let mut layer = MarkerLayer::new();
        layer.render(&list);

        let marker = &layer.markers()[0];
        assert_eq!(marker.label, list[0].name);
        assert_eq!(marker.point, list[0].point());
        assert!((cgmath::InnerSpace::magnitude(marker.position) - MARKER_RADIUS).abs() < 1e-12);
    }

    #[test]
    fn test_new_temporary_marker_survives_old_timer() {
        let mut layer = MarkerLayer::new();
        let first = layer.add_temporary(GeoPoint::new(1.0, 1.0), Duration::from_secs(2));
        let second = layer.add_temporary(GeoPoint::new(2.0, 2.0), Duration::from_secs(2));

        assert!(!layer.expire_temporary(first));
        assert_eq!(layer.temporary().unwrap().point, GeoPoint::new(2.0, 2.0));

        assert!(layer.expire_temporary(second));
        assert!(layer.temporary().is_none());
        assert!(!layer.expire_temporary(second));
    }

    #[test]
    fn test_temporary_marker_prunes_after_ttl() {
        let mut layer = MarkerLayer::new();
        let start = Instant::now();
        layer.add_temporary_at(GeoPoint::new(0.0, 0.0), Duration::from_millis(2000), start);

        assert!(!layer.prune_expired(start + Duration::from_millis(1999)));
        assert!(layer.temporary().is_some());
        assert!(layer.prune_expired(start + Duration::from_millis(2000)));
        assert!(layer.temporary().is_none());
    }

    #[test]
    fn test_temporary_marker_is_independent_of_render() {
        let mut layer = MarkerLayer::new();
        layer.add_temporary(GeoPoint::new(5.0, 5.0), Duration::from_secs(2));
        layer.render(&locations(&[("Lima", -12.05, -77.04)]));
        assert!(layer.temporary().is_some());
    }

    #[test]
    fn test_labels_hide_on_far_side() {
        // Default camera sits on +Z, which faces longitude -90
        let list = locations(&[("Facing", 0.0, -90.0), ("Hidden", 0.0, 90.0)]);
        let mut layer = MarkerLayer::new();
        layer.render(&list);

        let labels = layer.project_labels(&OrbitCamera::new(), Viewport::new(800.0, 600.0));
        assert_eq!(labels.len(), 2);
        assert!(labels[0].visible);
        assert!((labels[0].x - 400.0).abs() < 1e-6);
        assert!(!labels[1].visible);
    }

    #[test]
    fn test_labels_on_empty_layer() {
        let layer = MarkerLayer::new();
        assert!(layer
            .project_labels(&OrbitCamera::new(), Viewport::new(10.0, 10.0))
            .is_empty());
    }
}
