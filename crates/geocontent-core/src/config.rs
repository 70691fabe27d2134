use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides `default_region`.
pub const DEFAULT_REGION_ENV: &str = "GEOCONTENT_DEFAULT_REGION";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Region code used when the location cannot be determined
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Reverse geocoding endpoint
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Where the current position comes from
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Per-stage time limits
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Extra region greetings
    #[serde(default)]
    pub content: ContentConfig,
}

fn default_region() -> String {
    "US".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of the geocode.xyz compatible service
    #[serde(default = "default_geocode_url")]
    pub base_url: String,

    /// User-Agent sent with geocoding requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocode_url() -> String {
    "https://geocode.xyz".to_string()
}

fn default_user_agent() -> String {
    format!("GeoContent/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocode_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Source of the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// No geolocation capability; always use the default region
    #[default]
    None,
    /// Coordinates from `latitude`/`longitude`
    Fixed,
    /// IP-based lookup
    Ip,
    /// Capability present but the user refused access
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Endpoint used in `ip` mode
    #[serde(default = "default_ip_url")]
    pub ip_url: String,
}

fn default_ip_url() -> String {
    "https://ipapi.co/json/".to_string()
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            mode: GeolocationMode::None,
            latitude: None,
            longitude: None,
            ip_url: default_ip_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Seconds to wait for a position fix (0 = wait forever)
    #[serde(default = "default_geolocation_timeout")]
    pub geolocation_timeout_secs: u64,

    /// Seconds to wait for the reverse geocoding response (0 = wait forever)
    #[serde(default = "default_geocode_timeout")]
    pub geocode_timeout_secs: u64,

    /// Seconds to wait for region content (0 = wait forever)
    #[serde(default = "default_content_timeout")]
    pub content_timeout_secs: u64,
}

fn default_geolocation_timeout() -> u64 {
    10
}

fn default_geocode_timeout() -> u64 {
    10
}

fn default_content_timeout() -> u64 {
    5
}

fn secs_to_limit(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl ResolverConfig {
    pub fn geolocation_timeout(&self) -> Option<Duration> {
        secs_to_limit(self.geolocation_timeout_secs)
    }

    pub fn geocode_timeout(&self) -> Option<Duration> {
        secs_to_limit(self.geocode_timeout_secs)
    }

    pub fn content_timeout(&self) -> Option<Duration> {
        secs_to_limit(self.content_timeout_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            geolocation_timeout_secs: default_geolocation_timeout(),
            geocode_timeout_secs: default_geocode_timeout(),
            content_timeout_secs: default_content_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Region code -> greeting, merged over the built-in table
    #[serde(default)]
    pub greetings: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            geocoding: GeocodingConfig::default(),
            geolocation: GeolocationConfig::default(),
            resolver: ResolverConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            config
        };

        config.apply_region_override(std::env::var(DEFAULT_REGION_ENV).ok());
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load_at(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from(p),
            None => Self::load(),
        }
    }

    /// Validate, failing on errors and logging warnings.
    ///
    /// Call this after every override has been applied.
    pub fn ensure_valid(&self) -> Result<ValidationResult> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Replace `default_region` with a non-blank override
    pub fn apply_region_override(&mut self, region: Option<String>) {
        if let Some(region) = region.map(|r| r.trim().to_string()) {
            if !region.is_empty() {
                tracing::debug!("Default region overridden to {}", region);
                self.default_region = region;
            }
        }
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.default_region.trim().is_empty() {
            result.add_error("default_region", "Default region must not be empty");
        }

        validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);

        match self.geolocation.mode {
            GeolocationMode::Fixed => {
                match (self.geolocation.latitude, self.geolocation.longitude) {
                    (Some(lat), Some(lon)) => {
                        if !(-90.0..=90.0).contains(&lat) {
                            result.add_error(
                                "geolocation.latitude",
                                format!("Latitude out of range: {}", lat),
                            );
                        }
                        if !(-180.0..=180.0).contains(&lon) {
                            result.add_error(
                                "geolocation.longitude",
                                format!("Longitude out of range: {}", lon),
                            );
                        }
                    }
                    _ => result.add_error(
                        "geolocation",
                        "Fixed mode requires both latitude and longitude",
                    ),
                }
            }
            GeolocationMode::Ip => {
                validate_url(&self.geolocation.ip_url, "geolocation.ip_url", &mut result);
            }
            GeolocationMode::None | GeolocationMode::Denied => {}
        }

        for (field, secs) in [
            ("resolver.geolocation_timeout_secs", self.resolver.geolocation_timeout_secs),
            ("resolver.geocode_timeout_secs", self.resolver.geocode_timeout_secs),
            ("resolver.content_timeout_secs", self.resolver.content_timeout_secs),
        ] {
            if secs == 0 {
                result.add_warning(field, "Timeout disabled; a hung request will never finish");
            }
        }

        if self.content.greetings.keys().any(|k| k.trim().is_empty()) {
            result.add_warning("content.greetings", "Greeting with an empty region code is ignored");
        }

        result
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("no platform config directory".into()))?
            .join("geocontent");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }
            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => result.add_error(field_name, format!("Invalid URL: {}", e)),
    }
}
