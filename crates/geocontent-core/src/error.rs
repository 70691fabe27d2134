//! Error taxonomy shared by the GeoContent crates.
//!
//! Crate-level errors (geocoding, content lookup, timeouts) are mapped into
//! `AppError` at the application edge so the CLI can show a short,
//! non-technical hint next to the raw message.

use thiserror::Error;

/// Error as presented to the person running the app.
///
/// `Display` keeps the technical detail for logs; `user_message()` is the
/// hint to show instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Lookup service error: {0}")]
    Network(#[from] NetworkError),

    #[error("Settings error: {0}")]
    Config(#[from] ConfigError),

    #[error("Region resolution error: {0}")]
    Geo(#[from] GeoError),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Geo(e) => e.user_message(),
        }
    }
}

/// Failures talking to the geocoding or IP lookup services.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not reach lookup service: {0}")]
    ConnectionFailed(String),

    #[error("Lookup service did not answer in time")]
    Timeout,

    #[error("Lookup service returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Unreadable lookup response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Could not reach the location service. Check your internet connection."
            }
            NetworkError::Timeout => "The location service is slow to respond. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The location service is having trouble. Please try again later."
            }
            NetworkError::ServerError { .. } => "The location service refused the lookup.",
            NetworkError::InvalidResponse(_) => {
                "The location service sent something we could not read."
            }
        }
    }
}

/// Problems with the settings file or command line overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Settings location unavailable: {0}")]
    NotFound(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Malformed settings file {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "No settings directory found. Pass --config to choose one.",
            ConfigError::Invalid(_) => "Some settings are invalid. Check the region and URLs.",
            ConfigError::ParseError(_) => "The settings file is not valid TOML.",
        }
    }
}

/// Region resolution errors as seen by the application.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Reverse geocoding failed: {0}")]
    GeocodeFailed(String),

    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),

    #[error("Timed out waiting for {0}")]
    TimedOut(String),
}

impl GeoError {
    pub fn user_message(&self) -> &'static str {
        match self {
            GeoError::GeocodeFailed(_) => {
                "Could not determine your location. Please try again."
            }
            GeoError::ContentUnavailable(_) => "Regional content is unavailable right now.",
            GeoError::TimedOut(_) => "Finding your region took too long. Please try again.",
        }
    }
}

/// Classify a reqwest failure.
pub trait ReqwestErrorExt {
    fn to_network_error(&self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn to_network_error(&self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() || self.is_body() {
            return NetworkError::InvalidResponse(self.to_string());
        }
        match self.status() {
            Some(status) => NetworkError::ServerError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            },
            None => NetworkError::ConnectionFailed(self.to_string()),
        }
    }
}
