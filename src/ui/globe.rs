use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Theme};

use crate::geo::camera::{OrbitCamera, Viewport};
use crate::geo::{to_cartesian, to_geographic, Vec3};
use crate::ui::markers::{MarkerLayer, GLOBE_RADIUS};
use crate::Message;

/// Cursor travel (pixels) below which a press-release counts as a click
const CLICK_SLOP: f32 = 4.0;
/// Graticule spacing in degrees
const GRID_STEP: i32 = 30;
/// Sampling step along a graticule line in degrees
const LINE_STEP: i32 = 5;

const BACKGROUND: Color = Color::from_rgb(0.94, 0.94, 0.94);
const OCEAN: Color = Color::from_rgb(0.10, 0.45, 0.91);
const GRID: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.35);
const MARKER: Color = Color::from_rgb(1.0, 0.0, 0.0);
const TEMPORARY: Color = Color::WHITE;
const LABEL: Color = Color::from_rgb(0.08, 0.08, 0.08);

/// Canvas program drawing the 3D globe with its markers and labels
pub struct GlobeView<'a> {
    pub markers: &'a MarkerLayer,
    pub camera: &'a OrbitCamera,
}

impl Program<Message> for GlobeView<'_> {
    type State = DragState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let viewport = viewport(bounds);

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        if let Some((cx, cy, radius)) = self.camera.sphere_silhouette(viewport, GLOBE_RADIUS) {
            frame.fill(
                &Path::circle(Point::new(cx as f32, cy as f32), radius as f32),
                OCEAN,
            );
        }

        let grid = Stroke::default().with_color(GRID).with_width(1.0);
        for lat in (-90 + GRID_STEP..90).step_by(GRID_STEP as usize) {
            let line = (-180..=180)
                .step_by(LINE_STEP as usize)
                .map(|lng| to_cartesian(lat as f64, lng as f64, GLOBE_RADIUS));
            self.stroke_visible(&mut frame, viewport, line, grid);
        }
        for lng in (-180..180).step_by(GRID_STEP as usize) {
            let line = (-90..=90)
                .step_by(LINE_STEP as usize)
                .map(|lat| to_cartesian(lat as f64, lng as f64, GLOBE_RADIUS));
            self.stroke_visible(&mut frame, viewport, line, grid);
        }

        for marker in self.markers.markers() {
            if let Some(point) = self.visible_point(marker.position, viewport) {
                frame.fill(&Path::circle(point, 5.0), MARKER);
            }
        }

        if let Some(temporary) = self.markers.temporary() {
            if let Some(point) = self.visible_point(temporary.position, viewport) {
                frame.fill(&Path::circle(point, 5.0), TEMPORARY);
                frame.stroke(
                    &Path::circle(point, 5.0),
                    Stroke::default().with_color(MARKER).with_width(1.0),
                );
            }
        }

        // Labels are re-projected every frame so they track the camera
        for label in self.markers.project_labels(self.camera, viewport) {
            if !label.visible {
                continue;
            }
            frame.fill_text(canvas::Text {
                content: label.text,
                position: Point::new(label.x as f32 + 8.0, label.y as f32 - 8.0),
                color: LABEL,
                size: Pixels(13.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Mouse wheel for zooming
            canvas::Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let zoom_delta = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y,
                        mouse::ScrollDelta::Pixels { y, .. } => y * 0.05,
                    };
                    return (canvas::event::Status::Captured, Some(Message::Zoom(zoom_delta)));
                }
            }

            // Mouse button press - start a drag or a click
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if let (Some(_), Some(pos)) = (cursor.position_in(bounds), cursor.position()) {
                    state.pressed_at = Some(pos);
                    state.last_position = Some(pos);
                    state.dragged = false;
                    return (canvas::event::Status::Captured, Some(Message::OrbitGrab));
                }
            }

            // Mouse move - orbit if dragging
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if let (Some(pressed_at), Some(last)) = (state.pressed_at, state.last_position) {
                    if position.distance(pressed_at) > CLICK_SLOP {
                        state.dragged = true;
                    }
                    state.last_position = Some(position);

                    if state.dragged {
                        return (
                            canvas::event::Status::Captured,
                            Some(Message::Orbit {
                                dx: position.x - last.x,
                                dy: position.y - last.y,
                            }),
                        );
                    }
                    return (canvas::event::Status::Captured, None);
                }
            }

            // Mouse button release - finish the drag, or pick if it never moved
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.pressed_at.take().is_none() {
                    return (canvas::event::Status::Ignored, None);
                }
                state.last_position = None;

                if state.dragged {
                    state.dragged = false;
                    return (canvas::event::Status::Captured, Some(Message::OrbitRelease));
                }

                let picked = cursor.position_in(bounds).and_then(|pos| {
                    self.camera
                        .pick_sphere(pos.x as f64, pos.y as f64, viewport(bounds), GLOBE_RADIUS)
                });
                let message = match picked {
                    Some(hit) => Message::PointPicked(to_geographic(hit)),
                    None => Message::OrbitRelease,
                };
                return (canvas::event::Status::Captured, Some(message));
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if state.dragged {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

impl GlobeView<'_> {
    /// Screen position of a world point, if it is in front of the camera
    /// and on the visible hemisphere
    fn visible_point(&self, position: Vec3, viewport: Viewport) -> Option<Point> {
        if !self.camera.faces_camera(position, GLOBE_RADIUS) {
            return None;
        }
        self.camera
            .project(position, viewport)
            .map(|p| Point::new(p.x as f32, p.y as f32))
    }

    /// Stroke a polyline on the globe surface, skipping hidden stretches
    fn stroke_visible(
        &self,
        frame: &mut canvas::Frame,
        viewport: Viewport,
        line: impl Iterator<Item = Vec3>,
        stroke: Stroke<'_>,
    ) {
        let mut builder = canvas::path::Builder::new();
        let mut pen_down = false;

        for position in line {
            match self.visible_point(position, viewport) {
                Some(point) if pen_down => builder.line_to(point),
                Some(point) => {
                    builder.move_to(point);
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }

        frame.stroke(&builder.build(), stroke);
    }
}

fn viewport(bounds: Rectangle) -> Viewport {
    Viewport::new(bounds.width as f64, bounds.height as f64)
}

/// State for drag interactions
#[derive(Debug, Clone, Default)]
pub struct DragState {
    pub pressed_at: Option<Point>,
    pub last_position: Option<Point>,
    pub dragged: bool,
}
