//! OpenStreetMap Nominatim client
//!
//! Two read-only queries, both `format=json`:
//! - `GET {base}/search?q=<text>` for forward lookups
//! - `GET {base}/reverse?lat=<lat>&lon=<lng>` for reverse lookups
//!
//! Network and HTTP errors are logged and folded into the lookup's
//! not-found / unknown outcome.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{GeocodeError, Geocoder, Place};
use crate::geo::GeoPoint;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, reqwest::Error> {
        self.http
            .get(format!("{}/search", self.base_url))
            .query(&[("format", "json"), ("q", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<ReverseResponse, reqwest::Error> {
        self.http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn forward_lookup(&self, query: &str) -> Result<Place, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound(String::new()));
        }

        tracing::debug!(query, "forward lookup");
        match self.search(query).await {
            Ok(hits) => place_from_hits(query, &hits),
            Err(err) => {
                tracing::warn!(query, "forward lookup failed: {}", err);
                Err(GeocodeError::NotFound(query.to_string()))
            }
        }
    }

    async fn reverse_lookup(&self, lat: f64, lng: f64) -> Result<String, GeocodeError> {
        let point = GeoPoint::new(lat, lng);
        tracing::debug!(%point, "reverse lookup");

        match self.reverse(lat, lng).await {
            Ok(response) => response
                .address
                .as_ref()
                .and_then(Address::locality)
                .ok_or(GeocodeError::Unknown(point)),
            Err(err) => {
                tracing::warn!(%point, "reverse lookup failed: {}", err);
                Err(GeocodeError::Unknown(point))
            }
        }
    }
}

/// One entry of a `/search` response. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
}

impl Address {
    /// Most specific populated locality name
    pub fn locality(&self) -> Option<String> {
        [&self.city, &self.town, &self.village, &self.county, &self.state]
            .into_iter()
            .flatten()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .map(str::to_string)
    }
}

/// Turn the first usable search hit into a place
pub fn place_from_hits(query: &str, hits: &[SearchHit]) -> Result<Place, GeocodeError> {
    let Some(hit) = hits.first() else {
        return Err(GeocodeError::NotFound(query.to_string()));
    };

    let lat = hit.lat.trim().parse::<f64>();
    let lng = hit.lon.trim().parse::<f64>();
    let (Ok(lat), Ok(lng)) = (lat, lng) else {
        tracing::warn!(query, lat = %hit.lat, lon = %hit.lon, "search hit has unreadable coordinates");
        return Err(GeocodeError::NotFound(query.to_string()));
    };

    let short_name = hit.display_name.split(',').next().unwrap_or_default().trim();
    let name = if short_name.is_empty() {
        query.to_string()
    } else {
        short_name.to_string()
    };

    Ok(Place { lat, lng, name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_hit_wins_and_name_is_shortened() {
        let json = r#"[
            {"place_id": 1, "lat": "48.8588897", "lon": "2.3200410",
             "display_name": "Paris, Île-de-France, France métropolitaine, France"},
            {"place_id": 2, "lat": "33.6617962", "lon": "-95.5555130",
             "display_name": "Paris, Lamar County, Texas, United States"}
        ]"#;
        let hits: Vec<SearchHit> = serde_json::from_str(json).unwrap();

        let place = place_from_hits("paris", &hits).unwrap();
        assert_eq!(
            place,
            Place {
                lat: 48.8588897,
                lng: 2.3200410,
                name: "Paris".to_string(),
            }
        );
    }

    #[test]
    fn test_no_hits_is_not_found() {
        let hits: Vec<SearchHit> = serde_json::from_str("[]").unwrap();
        assert_eq!(
            place_from_hits("Nowhereville9999", &hits),
            Err(GeocodeError::NotFound("Nowhereville9999".to_string()))
        );
    }

    #[test]
    fn test_unreadable_coordinates_are_not_found() {
        let hits = vec![SearchHit {
            lat: "north".to_string(),
            lon: "2.0".to_string(),
            display_name: "Somewhere".to_string(),
        }];
        assert!(matches!(
            place_from_hits("somewhere", &hits),
            Err(GeocodeError::NotFound(_))
        ));
    }

    #[test]
    fn test_locality_preference_order() {
        let json = r#"{"address": {"village": "Hallstatt", "county": "Gmunden", "state": "Upper Austria"}}"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.address.unwrap().locality().as_deref(),
            Some("Hallstatt")
        );

        let json = r#"{"address": {"city": " ", "town": "Banff", "state": "Alberta"}}"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.address.unwrap().locality().as_deref(), Some("Banff"));
    }

    #[test]
    fn test_ocean_has_no_locality() {
        let response: ReverseResponse =
            serde_json::from_str(r#"{"error": "Unable to geocode"}"#).unwrap();
        assert!(response.address.is_none());

        let response: ReverseResponse =
            serde_json::from_str(r#"{"address": {"country": "France"}}"#).unwrap();
        assert_eq!(response.address.unwrap().locality(), None);
    }

    #[tokio::test]
    async fn test_blank_query_never_hits_the_network() {
        // Port 9 is discard; nothing is listening and nothing should be sent
        let client =
            NominatimClient::new("http://127.0.0.1:9", "travel-tracker-tests", Duration::from_millis(200))
                .unwrap();
        assert_eq!(
            client.forward_lookup("   ").await,
            Err(GeocodeError::NotFound(String::new()))
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_recoverable() {
        let client =
            NominatimClient::new("http://127.0.0.1:9", "travel-tracker-tests", Duration::from_millis(200))
                .unwrap();

        assert_eq!(
            client.forward_lookup("Lisbon").await,
            Err(GeocodeError::NotFound("Lisbon".to_string()))
        );
        assert_eq!(
            client.reverse_lookup(38.7, -9.1).await,
            Err(GeocodeError::Unknown(GeoPoint::new(38.7, -9.1)))
        );
    }
}
