//! Region resolution for GeoContent
//!
//! Determines the user's region from a position fix and a reverse geocoding
//! lookup, fetches region content, and renders the result.

pub mod content;
pub mod driver;
pub mod error;
pub mod resolver;
pub mod shell;
pub mod state;

pub use content::{content_fn, ContentFn, ContentSource, GreetingTable, FALLBACK_GREETING};
pub use driver::GeoContent;
pub use error::{ContentError, ResolveError, Stage};
pub use resolver::{RegionResolver, ResolverTimeouts};
pub use shell::{render, View};
pub use state::ResolutionState;
