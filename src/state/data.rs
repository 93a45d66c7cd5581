//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between the store,
//! the marker layer and the UI layer.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Date format used in storage and in the form
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stable identifier of a stored location, assigned at creation time
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct LocationId(Uuid);

impl LocationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visited place
///
/// Older saves used `location` for the label, stored empty strings for
/// missing dates and notes, and had no `id`; all three shapes load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    #[serde(default = "LocationId::generate")]
    pub id: LocationId,
    #[serde(alias = "location")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lng: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_text"
    )]
    pub notes: Option<String>,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Check a record read back from storage against the creation rules
    pub fn check(&self, rules: &ValidationRules) -> Result<(), ValidationError> {
        validate_fields(&self.name, self.date, self.lat, self.lng, rules)
    }
}

/// Why a location was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter a name for this location")]
    EmptyName,
    #[error("Please enter the date of your visit")]
    MissingDate,
    #[error("Latitude must be a finite number between -90 and 90 (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("Longitude must be a finite number between -180 and 180 (got {0})")]
    LongitudeOutOfRange(f64),
    #[error("Could not read {field} from \"{value}\"")]
    Unparseable { field: &'static str, value: String },
    #[error("Please click on the globe or map to set coordinates first")]
    MissingCoordinates,
}

/// Rules that vary between tracker variants
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationRules {
    pub require_date: bool,
}

/// An unvalidated location as entered by the user or returned by a lookup
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationDraft {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub lat: f64,
    pub lng: f64,
    pub notes: Option<String>,
}

impl LocationDraft {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            ..Self::default()
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validate and turn the draft into a storable record with a fresh id
    pub fn validate(self, rules: &ValidationRules) -> Result<Location, ValidationError> {
        let name = self.name.trim().to_string();
        validate_fields(&name, self.date, self.lat, self.lng, rules)?;

        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(Location {
            id: LocationId::generate(),
            name,
            date: self.date,
            lat: self.lat,
            lng: self.lng,
            notes,
        })
    }
}

fn validate_fields(
    name: &str,
    date: Option<NaiveDate>,
    lat: f64,
    lng: f64,
    rules: &ValidationRules,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if rules.require_date && date.is_none() {
        return Err(ValidationError::MissingDate);
    }
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::LatitudeOutOfRange(lat));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::LongitudeOutOfRange(lng));
    }
    Ok(())
}

fn serialize_date<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = deserialize_text(deserializer)? else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Optional string where `""` and `null` both mean absent
fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
