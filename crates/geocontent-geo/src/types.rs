use serde::{Deserialize, Serialize};

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Place names returned by a reverse geocoding lookup.
///
/// Every field is optional; empty strings are normalised to `None` when the
/// place is built from a service response. Whitespace is kept as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedPlace {
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
}

impl GeocodedPlace {
    pub fn new(city: Option<String>, country: Option<String>, region: Option<String>) -> Self {
        Self {
            city: non_empty(city),
            country: non_empty(country),
            region: non_empty(region),
        }
    }

    /// Both a city and a country were returned
    pub fn has_city_and_country(&self) -> bool {
        self.city.is_some() && self.country.is_some()
    }

    /// Region to display: the region code, else the country name
    pub fn display_region(&self) -> Option<&str> {
        self.region.as_deref().or(self.country.as_deref())
    }

    /// Region to look content up by: the region code, else `default`.
    ///
    /// Deliberately ignores `country` and whether a city was found.
    pub fn content_region<'a>(&'a self, default: &'a str) -> &'a str {
        self.region.as_deref().unwrap_or(default)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Geolocation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Location network error: {0}")]
    Network(String),
    #[error("Invalid location response: {0}")]
    InvalidResponse(String),
}

/// Reverse geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(Coordinates),
}
