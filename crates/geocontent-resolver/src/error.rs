//! Resolution error types and their mapping onto `geocontent_core::AppError`.

use std::fmt;
use std::time::Duration;

use geocontent_core::{AppError, GeoError, NetworkError, ReqwestErrorExt};
use geocontent_geo::GeocodeError;
use thiserror::Error;

/// Suspension points of a resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Geolocation,
    Geocode,
    Content,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geolocation => write!(f, "a position fix"),
            Self::Geocode => write!(f, "reverse geocoding"),
            Self::Content => write!(f, "region content"),
        }
    }
}

/// Failure of a content source.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    Unavailable(String),
}

impl ContentError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Terminal failure of a resolution attempt.
///
/// A refused or failed position fix is not an error; it selects the
/// default region instead.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Timed out after {after:?} waiting for {stage}")]
    Timeout { stage: Stage, after: Duration },
}

impl ResolveError {
    pub fn user_message(&self) -> &'static str {
        AppError::from(self).user_message()
    }
}

impl From<&ResolveError> for AppError {
    fn from(e: &ResolveError) -> Self {
        match e {
            ResolveError::Geocode(GeocodeError::Network(inner)) => {
                AppError::Network(inner.to_network_error())
            }
            ResolveError::Geocode(GeocodeError::Parse(msg)) => {
                AppError::Network(NetworkError::InvalidResponse(msg.clone()))
            }
            ResolveError::Geocode(other) => AppError::Geo(GeoError::GeocodeFailed(other.to_string())),
            ResolveError::Content(inner) => {
                AppError::Geo(GeoError::ContentUnavailable(inner.to_string()))
            }
            ResolveError::Timeout { stage, .. } => AppError::Geo(GeoError::TimedOut(stage.to_string())),
        }
    }
}
