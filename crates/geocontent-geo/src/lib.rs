//! Location services for GeoContent
//!
//! Position fixes (fixed, IP-based, or refused) and reverse geocoding via a
//! geocode.xyz compatible HTTP endpoint.

pub mod geocode;
pub mod location;
pub mod types;

pub use geocode::{GeocodeXyzClient, ReverseGeocoder};
pub use location::{DeniedGeolocation, FixedPosition, GeolocationProvider, IpGeolocation};
pub use types::*;
