//! Presentation of a `ResolutionState` as text.

use std::fmt;

use serde::Serialize;

use crate::state::ResolutionState;

pub const LOADING_TEXT: &str = "Loading...";
pub const HEADING: &str = "Geo-Specific Content";
pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_COUNTRY: &str = "Unknown Country";

/// What to show for a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum View {
    Loading,
    Error {
        message: String,
    },
    Content {
        region: String,
        city: String,
        country: String,
        content: String,
    },
}

/// Loading wins over error, error wins over content.
pub fn render(state: &ResolutionState) -> View {
    if state.loading {
        return View::Loading;
    }

    if let Some(message) = state.error_message() {
        return View::Error { message };
    }

    View::Content {
        region: state.region.clone(),
        city: state.city.clone().unwrap_or_else(|| UNKNOWN_CITY.to_string()),
        country: state
            .country
            .clone()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
        content: state.content.clone().unwrap_or_default(),
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Loading => write!(f, "{}", LOADING_TEXT),
            View::Error { message } => write!(f, "Error: {}", message),
            View::Content {
                region,
                city,
                country,
                content,
            } => {
                writeln!(f, "{}", HEADING)?;
                writeln!(f, "Region: {}", region)?;
                writeln!(f, "City: {}", city)?;
                writeln!(f, "Country: {}", country)?;
                write!(f, "Content: {}", content)
            }
        }
    }
}
