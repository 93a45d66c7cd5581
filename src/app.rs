//! Application context
//!
//! Owns everything the UI controller works with: the location store, the
//! marker layer, the geocoder and its lookup generations, the camera and
//! the form. The iced application holds exactly one of these, and every
//! controller action is a method here so it can be exercised without a
//! window.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{AppConfig, ViewMode};
use crate::geo::{GeoPoint, OrbitCamera};
use crate::geocode::{GeocodeError, Geocoder, LookupTicket, LookupTracker, Place};
use crate::state::{KvStore, Location, LocationDraft, LocationId, LocationStore, StoreError};
use crate::ui::form::FormState;
use crate::ui::markers::{MarkerLayer, TemporaryToken};

/// What became of a completed forward lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A newer search started since; the result was ignored
    Stale,
    Added(LocationId),
    /// A location with the same name is already stored
    AlreadySaved(LocationId),
    Failed,
}

pub struct AppContext<K: KvStore> {
    config: AppConfig,
    store: LocationStore<K>,
    markers: MarkerLayer,
    geocoder: Arc<dyn Geocoder>,
    searches: LookupTracker,
    reverse_lookups: LookupTracker,
    pub camera: OrbitCamera,
    pub form: FormState,
    pub search: String,
    pub view: ViewMode,
    status: String,
}

impl<K: KvStore> AppContext<K> {
    pub fn new(config: AppConfig, kv: K, geocoder: Arc<dyn Geocoder>) -> Self {
        let store = LocationStore::open(kv, config.storage_key.clone(), config.validation_rules());

        let mut markers = MarkerLayer::new();
        markers.render(store.locations());

        let status = if store.is_empty() {
            "No trips added yet. Pick a spot on the globe or map to start!".to_string()
        } else {
            format!("Loaded {} saved locations", store.len())
        };
        tracing::info!("🌍 Travel tracker ready with {} locations", store.len());

        Self {
            view: config.initial_view,
            config,
            store,
            markers,
            geocoder,
            searches: LookupTracker::new(),
            reverse_lookups: LookupTracker::new(),
            camera: OrbitCamera::new(),
            form: FormState::default(),
            search: String::new(),
            status,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn locations(&self) -> &[Location] {
        self.store.locations()
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.store.get(id)
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn geocoder(&self) -> Arc<dyn Geocoder> {
        Arc::clone(&self.geocoder)
    }

    pub fn is_searching(&self) -> bool {
        self.searches.is_busy()
    }

    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
    }

    fn refresh_markers(&mut self) {
        self.markers.render(self.store.locations());
    }

    /// Validate the form and store it as a new location
    pub fn submit_form(&mut self) -> Result<LocationId, StoreError> {
        let result = self
            .form
            .to_draft()
            .map_err(StoreError::from)
            .and_then(|draft| self.store.append(draft).map(|loc| loc.id));

        match &result {
            Ok(_) => {
                self.status = format!("Added: {}", self.form.name.trim());
                self.form.reset();
                self.refresh_markers();
            }
            Err(err) => self.status = err.to_string(),
        }
        result
    }

    pub fn delete(&mut self, id: LocationId) -> Result<Location, StoreError> {
        let result = self.store.remove(id);
        match &result {
            Ok(removed) => {
                self.status = format!("Deleted: {}", removed.name);
                self.refresh_markers();
            }
            Err(err) => self.status = err.to_string(),
        }
        result
    }

    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let result = self.store.clear();
        match &result {
            Ok(()) => {
                self.status = "Cleared all locations".to_string();
                self.refresh_markers();
            }
            Err(err) => self.status = err.to_string(),
        }
        result
    }

    /// A point was clicked on the globe or map: fill the form, drop a
    /// temporary marker and start naming the spot.
    ///
    /// The caller schedules expiry of the returned token and runs the
    /// reverse lookup for the returned ticket.
    pub fn pick_point(&mut self, point: GeoPoint) -> (TemporaryToken, LookupTicket) {
        self.form.set_point(point);
        if self.form.name_autofilled {
            self.form.name.clear();
        }
        let token = self
            .markers
            .add_temporary(point, self.config.temporary_marker_ttl());
        let ticket = self.reverse_lookups.start();
        self.status = format!("Coordinates: {}", point);
        tracing::debug!(%point, "point picked");
        (token, ticket)
    }

    pub fn expire_temporary(&mut self, token: TemporaryToken) {
        self.markers.expire_temporary(token);
    }

    /// Apply a reverse lookup result; stale results are dropped
    pub fn finish_reverse_lookup(
        &mut self,
        ticket: LookupTicket,
        point: GeoPoint,
        result: Result<String, GeocodeError>,
    ) -> bool {
        if !self.reverse_lookups.finish(ticket) {
            return false;
        }

        match result {
            Ok(name) => {
                // Never overwrite a name the user typed
                if self.form.name_autofilled || self.form.name.trim().is_empty() {
                    self.form.name = name.clone();
                    self.form.name_autofilled = true;
                }
                self.status = format!("Selected: {} ({})", name, point);
            }
            Err(err) => {
                tracing::debug!("{}", err);
                self.status = format!("Coordinates: {}", point);
            }
        }
        true
    }

    /// Start a search for the text in the search box
    pub fn begin_search(&mut self) -> Option<(LookupTicket, String)> {
        let query = self.search.trim().to_string();
        if query.is_empty() {
            // An emptied search box abandons whatever is still in flight
            self.searches.cancel();
            return None;
        }
        self.status = "Searching...".to_string();
        Some((self.searches.start(), query))
    }

    /// Apply a forward lookup result: store the place unless a location of
    /// the same name already exists. The store is untouched on failure.
    pub fn finish_search(
        &mut self,
        ticket: LookupTicket,
        result: Result<Place, GeocodeError>,
    ) -> SearchOutcome {
        if !self.searches.finish(ticket) {
            return SearchOutcome::Stale;
        }

        let place = match result {
            Ok(place) => place,
            Err(err) => {
                tracing::info!("{}", err);
                self.status = "Could not find that location".to_string();
                return SearchOutcome::Failed;
            }
        };

        if let Some(existing) = self.store.find_by_name(&place.name) {
            self.status = format!("{} is already on your list", existing.name);
            return SearchOutcome::AlreadySaved(existing.id);
        }

        let draft = LocationDraft::new(place.name.clone(), place.lat, place.lng);
        match self.store.append(draft) {
            Ok(location) => {
                let id = location.id;
                self.status = format!("Added: {}", place.name);
                self.search.clear();
                self.refresh_markers();
                SearchOutcome::Added(id)
            }
            Err(err) => {
                self.status = err.to_string();
                SearchOutcome::Failed
            }
        }
    }

    /// One animation frame: advance camera coasting and drop an overdue
    /// temporary marker
    pub fn tick(&mut self, now: Instant) -> bool {
        self.markers.prune_expired(now);
        self.camera.tick()
    }
}
