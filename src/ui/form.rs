use chrono::NaiveDate;

use crate::geo::GeoPoint;
use crate::state::data::DATE_FORMAT;
use crate::state::{LocationDraft, ValidationError};

/// Raw contents of the "add location" form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub name: String,
    pub date: String,
    pub lat: String,
    pub lng: String,
    pub notes: String,
    /// The name came from a reverse lookup, not from the user
    pub name_autofilled: bool,
}

impl FormState {
    /// Fill the coordinate fields from a picked point
    pub fn set_point(&mut self, point: GeoPoint) {
        self.lat = format!("{:.6}", point.lat);
        self.lng = format!("{:.6}", point.lng);
    }

    /// Name typed by the user; lookups leave it alone from now on
    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.name_autofilled = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse the text fields into a draft; range checks happen in the store
    pub fn to_draft(&self) -> Result<LocationDraft, ValidationError> {
        if self.lat.trim().is_empty() || self.lng.trim().is_empty() {
            return Err(ValidationError::MissingCoordinates);
        }

        let lat = parse_number("latitude", &self.lat)?;
        let lng = parse_number("longitude", &self.lng)?;

        let date = match self.date.trim() {
            "" => None,
            raw => Some(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                ValidationError::Unparseable {
                    field: "date",
                    value: raw.to_string(),
                }
            })?),
        };

        let mut draft = LocationDraft::new(self.name.clone(), lat, lng);
        if let Some(date) = date {
            draft = draft.with_date(date);
        }
        if !self.notes.trim().is_empty() {
            draft = draft.with_notes(self.notes.trim());
        }
        Ok(draft)
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::Unparseable {
            field,
            value: raw.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled() -> FormState {
        FormState {
            name: "Reykjavík".to_string(),
            date: "2023-09-14".to_string(),
            lat: "64.1466".to_string(),
            lng: "-21.9426".to_string(),
            notes: " Northern lights ".to_string(),
            name_autofilled: false,
        }
    }

    #[test]
    fn test_filled_form_parses() {
        let draft = filled().to_draft().unwrap();
        assert_eq!(
            draft,
            LocationDraft::new("Reykjavík", 64.1466, -21.9426)
                .with_date(NaiveDate::from_ymd_opt(2023, 9, 14).unwrap())
                .with_notes("Northern lights")
        );
    }

    #[test]
    fn test_missing_coordinates() {
        let form = FormState {
            lat: String::new(),
            ..filled()
        };
        assert_eq!(form.to_draft(), Err(ValidationError::MissingCoordinates));
    }

    #[test]
    fn test_unparseable_fields() {
        let form = FormState {
            lng: "west".to_string(),
            ..filled()
        };
        assert_eq!(
            form.to_draft(),
            Err(ValidationError::Unparseable {
                field: "longitude",
                value: "west".to_string()
            })
        );

        let form = FormState {
            date: "14/09/2023".to_string(),
            ..filled()
        };
        assert!(matches!(
            form.to_draft(),
            Err(ValidationError::Unparseable { field: "date", .. })
        ));
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let form = FormState {
            date: " ".to_string(),
            notes: String::new(),
            ..filled()
        };
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.date, None);
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn test_typing_clears_autofill() {
        let mut form = FormState {
            name: "Tokyo".to_string(),
            name_autofilled: true,
            ..FormState::default()
        };
        form.set_name("Home".to_string());
        assert_eq!(form.name, "Home");
        assert!(!form.name_autofilled);
    }

    #[test]
    fn test_set_point_and_reset() {
        let mut form = FormState::default();
        form.set_point(GeoPoint::new(-33.8688, 151.2093));
        assert_eq!(form.lat, "-33.868800");
        assert_eq!(form.lng, "151.209300");

        form.reset();
        assert_eq!(form, FormState::default());
    }
}
