//! Geolocation capability: single-shot "where am I" requests.
//!
//! A host without any geolocation support is modelled by not having a
//! provider at all (`Option<Arc<dyn GeolocationProvider>>` is `None`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::types::{Coordinates, LocationError};

const IPAPI_URL: &str = "https://ipapi.co/json/";

/// Source of the current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Request the current position once.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Always reports the same coordinates.
#[derive(Debug, Clone)]
pub struct FixedPosition {
    coords: Coordinates,
}

impl FixedPosition {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl GeolocationProvider for FixedPosition {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if !self.coords.is_valid() {
            return Err(LocationError::InvalidResponse(format!(
                "coordinates out of range: {}",
                self.coords
            )));
        }
        Ok(self.coords)
    }
}

/// A capability that exists but whose permission was refused.
#[derive(Debug, Clone, Default)]
pub struct DeniedGeolocation;

#[async_trait]
impl GeolocationProvider for DeniedGeolocation {
    fn name(&self) -> &str {
        "denied"
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

/// Approximate position from the caller's public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocation {
    client: Client,
    url: String,
}

impl IpGeolocation {
    pub fn new(user_agent: &str) -> Result<Self, LocationError> {
        Self::with_url(IPAPI_URL, user_agent)
    }

    pub fn with_url(url: &str, user_agent: &str) -> Result<Self, LocationError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| LocationError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl GeolocationProvider for IpGeolocation {
    fn name(&self) -> &str {
        "ip"
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LocationError::ServiceUnavailable(format!(
                "IP lookup returned status {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(LocationError::Network(format!(
                "IP lookup returned status {}",
                status
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        if body.error {
            return Err(LocationError::InvalidResponse(
                body.reason.unwrap_or_else(|| "lookup refused".into()),
            ));
        }

        let latitude = body
            .latitude
            .ok_or_else(|| LocationError::InvalidResponse("no latitude".into()))?;
        let longitude = body
            .longitude
            .ok_or_else(|| LocationError::InvalidResponse("no longitude".into()))?;

        let coords = Coordinates::new(latitude, longitude);
        tracing::debug!("IP geolocation resolved to {}", coords);
        Ok(coords)
    }
}
