use iced::widget::{button, canvas, column, container, row, text, text_input, Column};
use iced::{Element, Length, Subscription, Task, Theme};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod geo;
mod geocode;
mod state;
mod ui;

use app::{AppContext, SearchOutcome};
use config::{AppConfig, ViewMode};
use geo::GeoPoint;
use geocode::{GeocodeError, Geocoder, LookupTicket, NominatimClient, Place};
use state::{KvStore, LocationId, MemoryKv, SqliteKv};
use ui::globe::GlobeView;
use ui::map::MapView;
use ui::markers::TemporaryToken;

/// Main application state
struct TravelTracker {
    ctx: AppContext<Box<dyn KvStore>>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    NameChanged(String),
    DateChanged(String),
    LatChanged(String),
    LngChanged(String),
    NotesChanged(String),
    /// User clicked "Add Location"
    SubmitForm,
    DeleteLocation(LocationId),
    ClearAll,
    SearchChanged(String),
    SearchSubmitted,
    /// Background forward lookup completed
    SearchFinished(LookupTicket, Result<Place, GeocodeError>),
    /// Background reverse lookup completed
    ReverseLookupFinished(LookupTicket, GeoPoint, Result<String, GeocodeError>),
    /// A point was clicked on the globe or the map
    PointPicked(GeoPoint),
    OrbitGrab,
    Orbit { dx: f32, dy: f32 },
    OrbitRelease,
    Zoom(f32),
    /// Animation frame while the globe is coasting
    Frame,
    TemporaryExpired(TemporaryToken),
    ToggleView,
}

impl TravelTracker {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = AppConfig::load();

        // A broken database is not fatal: keep working in memory for this session
        let mut storage_note = None;
        let kv: Box<dyn KvStore> = match SqliteKv::open(config.database_path()) {
            Ok(kv) => Box::new(kv),
            Err(err) => {
                tracing::error!("❌ Could not open storage: {}", err);
                storage_note = Some(format!("Storage unavailable, changes will not be saved ({})", err));
                Box::new(MemoryKv::new())
            }
        };

        let geocoder: Arc<dyn Geocoder> = match NominatimClient::new(
            config.geocoder_url.clone(),
            &config.user_agent,
            config.request_timeout(),
        ) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                tracing::error!("❌ Could not set up the geocoder, lookups are disabled: {}", err);
                Arc::new(geocode::Offline)
            }
        };

        let mut ctx = AppContext::new(config, kv, geocoder);
        if let Some(note) = storage_note {
            ctx.set_status(note);
        }

        (TravelTracker { ctx }, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::NameChanged(value) => self.ctx.form.set_name(value),
            Message::DateChanged(value) => self.ctx.form.date = value,
            Message::LatChanged(value) => self.ctx.form.lat = value,
            Message::LngChanged(value) => self.ctx.form.lng = value,
            Message::NotesChanged(value) => self.ctx.form.notes = value,

            Message::SubmitForm => {
                if let Err(err) = self.ctx.submit_form() {
                    tracing::debug!("form rejected: {}", err);
                }
            }

            Message::DeleteLocation(id) => {
                let name = match self.ctx.location(id) {
                    Some(location) => location.name.clone(),
                    None => return Task::none(),
                };
                if confirm("Delete location", &format!("Remove {} from your trips?", name)) {
                    if let Err(err) = self.ctx.delete(id) {
                        tracing::warn!("⚠️  Delete failed: {}", err);
                    }
                }
            }

            Message::ClearAll => {
                if self.ctx.locations().is_empty() {
                    return Task::none();
                }
                if confirm("Clear all", "Remove every saved location? This cannot be undone.") {
                    if let Err(err) = self.ctx.clear_all() {
                        tracing::warn!("⚠️  Clear failed: {}", err);
                    }
                }
            }

            Message::SearchChanged(value) => self.ctx.search = value,

            Message::SearchSubmitted => {
                if let Some((ticket, query)) = self.ctx.begin_search() {
                    let geocoder = self.ctx.geocoder();
                    return Task::perform(
                        async move { geocoder.forward_lookup(&query).await },
                        move |result| Message::SearchFinished(ticket, result),
                    );
                }
            }

            Message::SearchFinished(ticket, result) => {
                match self.ctx.finish_search(ticket, result) {
                    SearchOutcome::Added(id) => tracing::info!("✅ Added location {} from search", id),
                    SearchOutcome::AlreadySaved(id) => {
                        tracing::debug!(%id, "search matched a saved location")
                    }
                    SearchOutcome::Stale | SearchOutcome::Failed => {}
                }
            }

            Message::PointPicked(point) => {
                self.ctx.camera.release();
                let (token, ticket) = self.ctx.pick_point(point);
                let ttl = self.ctx.config().temporary_marker_ttl();
                let geocoder = self.ctx.geocoder();

                return Task::batch([
                    Task::perform(tokio::time::sleep(ttl), move |_| Message::TemporaryExpired(token)),
                    Task::perform(
                        async move { geocoder.reverse_lookup(point.lat, point.lng).await },
                        move |result| Message::ReverseLookupFinished(ticket, point, result),
                    ),
                ]);
            }

            Message::ReverseLookupFinished(ticket, point, result) => {
                self.ctx.finish_reverse_lookup(ticket, point, result);
            }

            Message::TemporaryExpired(token) => self.ctx.expire_temporary(token),

            Message::OrbitGrab => self.ctx.camera.grab(),
            Message::Orbit { dx, dy } => self.ctx.camera.orbit(dx as f64, dy as f64),
            Message::OrbitRelease => self.ctx.camera.release(),
            Message::Zoom(delta) => self.ctx.camera.zoom(delta as f64),
            Message::Frame => {
                self.ctx.tick(Instant::now());
            }

            Message::ToggleView => self.ctx.toggle_view(),
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let search_button = if self.ctx.is_searching() {
            button("Searching...").padding(8)
        } else {
            button("Search")
                .on_press(Message::SearchSubmitted)
                .padding(8)
        };

        let form = &self.ctx.form;
        let sidebar: Column<Message> = column![
            text("Travel Tracker").size(32),
            text(self.ctx.status()).size(14),
            row![
                text_input("Search for a place...", &self.ctx.search)
                    .on_input(Message::SearchChanged)
                    .on_submit(Message::SearchSubmitted)
                    .padding(8),
                search_button,
            ]
            .spacing(8),
            text("Add a location").size(20),
            text_input("Name", &form.name)
                .on_input(Message::NameChanged)
                .padding(8),
            text_input("Date (YYYY-MM-DD)", &form.date)
                .on_input(Message::DateChanged)
                .padding(8),
            row![
                text_input("Latitude", &form.lat)
                    .on_input(Message::LatChanged)
                    .padding(8),
                text_input("Longitude", &form.lng)
                    .on_input(Message::LngChanged)
                    .padding(8),
            ]
            .spacing(8),
            text_input("Notes", &form.notes)
                .on_input(Message::NotesChanged)
                .on_submit(Message::SubmitForm)
                .padding(8),
            row![
                button("Add Location")
                    .on_press(Message::SubmitForm)
                    .padding(8),
                button("Clear All")
                    .on_press(Message::ClearAll)
                    .style(button::danger)
                    .padding(8),
                button(match self.ctx.view {
                    ViewMode::Globe => "Show Map",
                    ViewMode::Map => "Show Globe",
                })
                .on_press(Message::ToggleView)
                .style(button::secondary)
                .padding(8),
            ]
            .spacing(8),
            text(format!("Saved locations ({})", self.ctx.locations().len())).size(20),
            ui::list::location_list(self.ctx.locations()),
        ]
        .spacing(12)
        .padding(20)
        .width(Length::Fixed(360.0));

        let viewer: Element<Message> = match self.ctx.view {
            ViewMode::Globe => canvas(GlobeView {
                markers: self.ctx.markers(),
                camera: &self.ctx.camera,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            ViewMode::Map => canvas(MapView {
                markers: self.ctx.markers(),
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
        };

        row![
            sidebar,
            container(viewer).width(Length::Fill).height(Length::Fill),
        ]
        .into()
    }

    /// Animation frames only while the globe keeps spinning after a drag
    fn subscription(&self) -> Subscription<Message> {
        if self.ctx.view == ViewMode::Globe && self.ctx.camera.is_coasting() {
            iced::window::frames().map(|_| Message::Frame)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Ask the user a yes/no question with a native dialog
fn confirm(title: &str, description: &str) -> bool {
    let answer = MessageDialog::new()
        .set_title(title)
        .set_description(description)
        .set_level(MessageLevel::Warning)
        .set_buttons(MessageButtons::YesNo)
        .show();
    matches!(answer, MessageDialogResult::Yes)
}

fn main() -> iced::Result {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    iced::application(
        "Travel Tracker",
        TravelTracker::update,
        TravelTracker::view,
    )
    .subscription(TravelTracker::subscription)
    .theme(TravelTracker::theme)
    .centered()
    .run_with(TravelTracker::new)
}
