//! Flat map view
//!
//! An equirectangular projection of the whole world, letterboxed into the
//! canvas at a 2:1 aspect ratio. Clicking picks a point; hovering a pin shows
//! its details in a popup.

use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Path, Program, Stroke};
use iced::{Color, Pixels, Point, Rectangle, Renderer, Size, Theme};

use crate::geo::GeoPoint;
use crate::ui::markers::{Marker, MarkerLayer};
use crate::Message;

/// Pixel radius around a pin that counts as hovering it
const HOVER_RADIUS: f32 = 8.0;
const GRID_STEP: i32 = 30;

const BACKGROUND: Color = Color::from_rgb(0.94, 0.94, 0.94);
const WATER: Color = Color::from_rgb(0.67, 0.83, 0.96);
const GRID: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.15);
const PIN: Color = Color::from_rgb(0.86, 0.12, 0.12);
const TEMPORARY: Color = Color::WHITE;
const TEXT: Color = Color::from_rgb(0.08, 0.08, 0.08);
const POPUP: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.95);

/// Maps between geographic coordinates and canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapProjection {
    /// The world rectangle inside the canvas
    area: Rectangle,
}

impl MapProjection {
    /// Largest centred 2:1 rectangle that fits in `size`
    pub fn fit(size: Size) -> Self {
        let width = size.width.min(size.height * 2.0);
        let height = width / 2.0;
        Self {
            area: Rectangle {
                x: (size.width - width) / 2.0,
                y: (size.height - height) / 2.0,
                width,
                height,
            },
        }
    }

    pub fn area(&self) -> Rectangle {
        self.area
    }

    pub fn project(&self, point: GeoPoint) -> Point {
        Point::new(
            self.area.x + ((point.lng + 180.0) / 360.0) as f32 * self.area.width,
            self.area.y + ((90.0 - point.lat) / 180.0) as f32 * self.area.height,
        )
    }

    /// Geographic point under a canvas position, if it lies on the map
    pub fn unproject(&self, position: Point) -> Option<GeoPoint> {
        if self.area.width <= 0.0 || !self.area.contains(position) {
            return None;
        }
        let u = f64::from((position.x - self.area.x) / self.area.width);
        let v = f64::from((position.y - self.area.y) / self.area.height);
        Some(GeoPoint::new(
            (90.0 - v * 180.0).clamp(-90.0, 90.0),
            (u * 360.0 - 180.0).clamp(-180.0, 180.0),
        ))
    }
}

/// Canvas program drawing the flat map
pub struct MapView<'a> {
    pub markers: &'a MarkerLayer,
}

impl MapView<'_> {
    fn hovered(&self, projection: &MapProjection, cursor: Point) -> Option<&Marker> {
        self.markers
            .markers()
            .iter()
            .rev()
            .find(|marker| projection.project(marker.point).distance(cursor) <= HOVER_RADIUS)
    }
}

impl Program<Message> for MapView<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let projection = MapProjection::fit(bounds.size());
        let area = projection.area();

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);
        frame.fill_rectangle(area.position(), area.size(), WATER);

        let grid = Stroke::default().with_color(GRID).with_width(1.0);
        for lat in (-90..=90).step_by(GRID_STEP as usize) {
            let y = projection.project(GeoPoint::new(lat as f64, 0.0)).y;
            frame.stroke(
                &Path::line(Point::new(area.x, y), Point::new(area.x + area.width, y)),
                grid,
            );
        }
        for lng in (-180..=180).step_by(GRID_STEP as usize) {
            let x = projection.project(GeoPoint::new(0.0, lng as f64)).x;
            frame.stroke(
                &Path::line(Point::new(x, area.y), Point::new(x, area.y + area.height)),
                grid,
            );
        }

        for marker in self.markers.markers() {
            let pin = projection.project(marker.point);
            frame.fill(&Path::circle(pin, 5.0), PIN);
            frame.fill_text(canvas::Text {
                content: marker.label.clone(),
                position: Point::new(pin.x + 7.0, pin.y - 14.0),
                color: TEXT,
                size: Pixels(12.0),
                ..canvas::Text::default()
            });
        }

        if let Some(temporary) = self.markers.temporary() {
            let pin = projection.project(temporary.point);
            frame.fill(&Path::circle(pin, 5.0), TEMPORARY);
            frame.stroke(
                &Path::circle(pin, 5.0),
                Stroke::default().with_color(PIN).with_width(1.0),
            );
        }

        // Popup with name, date and notes for the pin under the cursor
        if let Some(position) = cursor.position_in(bounds) {
            if let Some(marker) = self.hovered(&projection, position) {
                let lines = popup_lines(marker);
                let pin = projection.project(marker.point);
                let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f32 * 7.0 + 16.0;
                let height = lines.len() as f32 * 16.0 + 10.0;
                let origin = Point::new(
                    (pin.x + 10.0).min(bounds.width - width).max(0.0),
                    (pin.y - height - 10.0).max(0.0),
                );

                frame.fill_rectangle(origin, Size::new(width, height), POPUP);
                for (row, line) in lines.into_iter().enumerate() {
                    frame.fill_text(canvas::Text {
                        content: line,
                        position: Point::new(origin.x + 8.0, origin.y + 5.0 + row as f32 * 16.0),
                        color: TEXT,
                        size: Pixels(13.0),
                        ..canvas::Text::default()
                    });
                }
            }
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let picked = cursor
                    .position_in(bounds)
                    .and_then(|pos| MapProjection::fit(bounds.size()).unproject(pos));
                if let Some(point) = picked {
                    return (canvas::event::Status::Captured, Some(Message::PointPicked(point)));
                }
            }
            // Redraw so the hover popup follows the cursor
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if cursor.is_over(bounds) => {
                return (canvas::event::Status::Captured, None);
            }
            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        match cursor.position_in(bounds) {
            Some(position) if self.hovered(&MapProjection::fit(bounds.size()), position).is_some() => {
                mouse::Interaction::Pointer
            }
            Some(_) => mouse::Interaction::Crosshair,
            None => mouse::Interaction::default(),
        }
    }
}

fn popup_lines(marker: &Marker) -> Vec<String> {
    let mut lines = vec![marker.label.clone()];
    if let Some(date) = &marker.date {
        lines.push(date.clone());
    }
    lines.push(marker.notes.clone().unwrap_or_else(|| "No notes".to_string()));
    lines
}
