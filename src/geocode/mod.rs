//! Geocoding
//!
//! Best-effort translation between place names and coordinates through an
//! external lookup service. Every failure here is recoverable: callers show
//! a status message and carry on.

pub mod nominatim;
pub mod tracker;

use async_trait::async_trait;
use thiserror::Error;

use crate::geo::GeoPoint;

pub use nominatim::NominatimClient;
pub use tracker::{LookupTicket, LookupTracker};

/// A forward lookup result
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    /// Short display name (first segment of the service's full name)
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    /// No result for the query, or the service could not be reached
    #[error("Could not find \"{0}\"")]
    NotFound(String),
    /// No locality name for the coordinates, or the service could not be reached
    #[error("No place name known at {0}")]
    Unknown(GeoPoint),
}

/// A text search / reverse lookup service.
///
/// Lookups are single-shot with no retries; a failure is final for that
/// attempt.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve free text to one coordinate pair and a display name
    async fn forward_lookup(&self, query: &str) -> Result<Place, GeocodeError>;

    /// Resolve coordinates to a locality name
    /// (city, then town, village, county, state)
    async fn reverse_lookup(&self, lat: f64, lng: f64) -> Result<String, GeocodeError>;
}

/// Stand-in used when no lookup service could be set up.
/// Every lookup fails the same way an unreachable service would.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl Geocoder for Offline {
    async fn forward_lookup(&self, query: &str) -> Result<Place, GeocodeError> {
        Err(GeocodeError::NotFound(query.trim().to_string()))
    }

    async fn reverse_lookup(&self, lat: f64, lng: f64) -> Result<String, GeocodeError> {
        Err(GeocodeError::Unknown(GeoPoint::new(lat, lng)))
    }
}
