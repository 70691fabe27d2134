use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::ResolveError;

/// Snapshot of one resolution attempt.
///
/// Starts as `initial(default_region)` with `loading == true`; the attempt
/// replaces it once with a settled snapshot carrying either `content` or
/// `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionState {
    pub region: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub content: Option<String>,
    pub loading: bool,
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<Arc<ResolveError>>,
}

fn serialize_error<S>(error: &Option<Arc<ResolveError>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl ResolutionState {
    pub fn initial(default_region: &str) -> Self {
        Self {
            region: default_region.to_string(),
            city: None,
            country: None,
            content: None,
            loading: true,
            error: None,
        }
    }

    /// The attempt has finished, one way or the other
    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}
