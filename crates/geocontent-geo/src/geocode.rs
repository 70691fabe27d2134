//! Reverse geocoding: convert coordinates to city, country and region names.
//! Uses geocode.xyz - free, no API key required.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};

use crate::types::{Coordinates, GeocodeError, GeocodedPlace};

const GEOCODE_XYZ_URL: &str = "https://geocode.xyz";
const USER_AGENT: &str = concat!("GeoContent/", env!("CARGO_PKG_VERSION"));

/// Converts a position fix into place names.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, coords: Coordinates) -> Result<GeocodedPlace, GeocodeError>;
}

/// Response body of `GET /{lat},{lon}?geoit=json`.
///
/// geocode.xyz sends `{}` instead of a string for values it cannot fill, so
/// every field goes through `lenient_string`.
#[derive(Debug, Default, Deserialize)]
struct GeocodeXyzResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    city: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    region: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// HTTP client for a geocode.xyz compatible endpoint.
#[derive(Debug, Clone)]
pub struct GeocodeXyzClient {
    client: Client,
    base_url: String,
}

impl GeocodeXyzClient {
    pub fn new() -> Result<Self, GeocodeError> {
        Self::with_base_url(GEOCODE_XYZ_URL, USER_AGENT)
    }

    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request_url(&self, coords: Coordinates) -> String {
        format!(
            "{}/{},{}?geoit=json",
            self.base_url, coords.latitude, coords.longitude
        )
    }
}

#[async_trait]
impl ReverseGeocoder for GeocodeXyzClient {
    #[tracing::instrument(skip(self), level = "info")]
    async fn reverse(&self, coords: Coordinates) -> Result<GeocodedPlace, GeocodeError> {
        if !coords.is_valid() {
            return Err(GeocodeError::InvalidCoordinates(coords));
        }

        let response = self.client.get(self.request_url(coords)).send().await?;

        // Error statuses still carry a JSON body worth reading; only an
        // unparseable body fails the lookup.
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Reverse geocode returned status {}", status);
        }

        let bytes = response.bytes().await?;
        let body: GeocodeXyzResponse = serde_json::from_slice(&bytes)
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let place = GeocodedPlace::new(body.city, body.country, body.region);
        tracing::info!(
            city = place.city.as_deref().unwrap_or("-"),
            country = place.country.as_deref().unwrap_or("-"),
            region = place.region.as_deref().unwrap_or("-"),
            "Reverse geocoded"
        );
        Ok(place)
    }
}
