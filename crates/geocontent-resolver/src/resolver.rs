//! Region resolution flow.
//!
//! Position fix -> reverse geocode -> content lookup, each step bounded by
//! its own timeout:
//!
//! - no provider, or the provider fails: content for the default region
//! - geocode gives city and country: those plus region (or country) are kept
//! - content is always fetched for `place.region` else the default region
//! - geocode/content failures and timeouts end the attempt with an error

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use geocontent_core::ResolverConfig;
use geocontent_geo::{Coordinates, GeolocationProvider, ReverseGeocoder};

use crate::content::ContentSource;
use crate::error::{ResolveError, Stage};
use crate::state::ResolutionState;

/// Upper bounds for each suspension point. `None` waits forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverTimeouts {
    pub geolocation: Option<Duration>,
    pub geocode: Option<Duration>,
    pub content: Option<Duration>,
}

impl ResolverTimeouts {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            geolocation: config.geolocation_timeout(),
            geocode: config.geocode_timeout(),
            content: config.content_timeout(),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            geolocation: None,
            geocode: None,
            content: None,
        }
    }
}

impl Default for ResolverTimeouts {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

async fn bounded<F, T>(stage: Stage, limit: Option<Duration>, fut: F) -> Result<T, ResolveError>
where
    F: Future<Output = T>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| ResolveError::Timeout { stage, after }),
        None => Ok(fut.await),
    }
}

pub struct RegionResolver {
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    geocoder: Arc<dyn ReverseGeocoder>,
    timeouts: ResolverTimeouts,
}

impl RegionResolver {
    pub fn new(
        geolocation: Option<Arc<dyn GeolocationProvider>>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        Self {
            geolocation,
            geocoder,
            timeouts: ResolverTimeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: ResolverTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Run one resolution attempt to completion and return its settled state.
    #[tracing::instrument(skip(self, content), level = "info")]
    pub async fn resolve(&self, default_region: &str, content: &dyn ContentSource) -> ResolutionState {
        let mut state = ResolutionState::initial(default_region);

        match self.run(default_region, content, &mut state).await {
            Ok(()) => tracing::info!(region = %state.region, "Region content resolved"),
            Err(e) => {
                tracing::warn!("Region resolution failed: {}", e);
                state.content = None;
                state.error = Some(Arc::new(e));
            }
        }

        state.loading = false;
        state
    }

    async fn run(
        &self,
        default_region: &str,
        content: &dyn ContentSource,
        state: &mut ResolutionState,
    ) -> Result<(), ResolveError> {
        let content_region = match self.position_fix(default_region).await? {
            Some(coords) => {
                let place = bounded(Stage::Geocode, self.timeouts.geocode, self.geocoder.reverse(coords))
                    .await??;

                if place.has_city_and_country() {
                    state.city = place.city.clone();
                    state.country = place.country.clone();
                    if let Some(region) = place.display_region() {
                        state.region = region.to_string();
                    }
                } else {
                    tracing::debug!("Geocode response lacks city or country; keeping defaults");
                }

                place.content_region(default_region).to_string()
            }
            None => default_region.to_string(),
        };

        let text = bounded(Stage::Content, self.timeouts.content, content.fetch(&content_region))
            .await??;
        state.content = Some(text);
        Ok(())
    }

    /// `Ok(None)` means "use the default region": no capability, or the
    /// provider refused/failed. Only exceeding the time limit is an error.
    async fn position_fix(&self, default_region: &str) -> Result<Option<Coordinates>, ResolveError> {
        let Some(provider) = &self.geolocation else {
            tracing::debug!("No geolocation capability; using default region {}", default_region);
            return Ok(None);
        };

        match bounded(Stage::Geolocation, self.timeouts.geolocation, provider.current_position()).await? {
            Ok(coords) => {
                tracing::debug!("Position fix from {}: {}", provider.name(), coords);
                Ok(Some(coords))
            }
            Err(e) => {
                tracing::info!(
                    "Geolocation via {} failed ({}); using default region {}",
                    provider.name(),
                    e,
                    default_region
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{content_fn, GreetingTable, FALLBACK_GREETING};
    use crate::error::ContentError;
    use async_trait::async_trait;
    use geocontent_geo::{
        DeniedGeolocation, FixedPosition, GeocodeError, GeocodedPlace, LocationError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Geocoder answering from memory and counting calls.
    struct StaticGeocoder {
        place: Option<GeocodedPlace>,
        calls: AtomicUsize,
    }

    impl StaticGeocoder {
        fn answering(city: Option<&str>, country: Option<&str>, region: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                place: Some(GeocodedPlace::new(
                    city.map(String::from),
                    country.map(String::from),
                    region.map(String::from),
                )),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                place: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ReverseGeocoder for StaticGeocoder {
        async fn reverse(&self, _coords: Coordinates) -> Result<GeocodedPlace, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.place
                .clone()
                .ok_or_else(|| GeocodeError::Parse("unexpected end of input".into()))
        }
    }

    struct HangingGeolocation;

    #[async_trait]
    impl GeolocationProvider for HangingGeolocation {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    fn paris_fix() -> Option<Arc<dyn GeolocationProvider>> {
        Some(Arc::new(FixedPosition::new(Coordinates::new(48.8566, 2.3522))))
    }

    #[tokio::test]
    async fn test_no_geolocation_uses_default_region() {
        let geocoder = StaticGeocoder::failing();
        let resolver = RegionResolver::new(None, geocoder.clone());

        for region in ["US", "CA", "UK", "XX"] {
            let state = resolver.resolve(region, &GreetingTable::default()).await;
            assert_eq!(state.region, region);
            assert_eq!(state.city, None);
            assert_eq!(state.country, None);
            assert_eq!(
                state.content.as_deref(),
                Some(GreetingTable::default().lookup(region))
            );
            assert!(!state.loading);
            assert!(state.error.is_none());
        }
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denied_geolocation_falls_back() {
        let geocoder = StaticGeocoder::failing();
        let resolver = RegionResolver::new(Some(Arc::new(DeniedGeolocation)), geocoder.clone());

        let state = resolver.resolve("CA", &GreetingTable::default()).await;

        assert_eq!(state.region, "CA");
        assert_eq!(state.content.as_deref(), Some("Bonjour du Canada!"));
        assert!(state.error.is_none());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_geocode_updates_place() {
        let geocoder = StaticGeocoder::answering(Some("Paris"), Some("France"), Some("FR"));
        let resolver = RegionResolver::new(paris_fix(), geocoder);

        let state = resolver.resolve("US", &GreetingTable::default()).await;

        assert_eq!(state.region, "FR");
        assert_eq!(state.city.as_deref(), Some("Paris"));
        assert_eq!(state.country.as_deref(), Some("France"));
        assert_eq!(state.content.as_deref(), Some(FALLBACK_GREETING));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_region_falls_back_to_country_name() {
        let geocoder = StaticGeocoder::answering(Some("Toronto"), Some("Canada"), None);
        let resolver = RegionResolver::new(paris_fix(), geocoder);

        let state = resolver.resolve("CA", &GreetingTable::default()).await;

        assert_eq!(state.region, "Canada");
        assert_eq!(state.city.as_deref(), Some("Toronto"));
        // Content is looked up by region code only, so the default wins here
        assert_eq!(state.content.as_deref(), Some("Bonjour du Canada!"));
    }

    #[tokio::test]
    async fn test_incomplete_geocode_keeps_place_but_uses_region_for_content() {
        let geocoder = StaticGeocoder::answering(None, Some("United Kingdom"), Some("UK"));
        let resolver = RegionResolver::new(paris_fix(), geocoder);

        let state = resolver.resolve("US", &GreetingTable::default()).await;

        assert_eq!(state.city, None);
        assert_eq!(state.country, None);
        assert_eq!(state.region, "US");
        assert_eq!(
            state.content.as_deref(),
            Some("Greetings from the United Kingdom!")
        );
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_empty_geocode_uses_default_content() {
        let geocoder = StaticGeocoder::answering(None, None, None);
        let resolver = RegionResolver::new(paris_fix(), geocoder);

        let state = resolver.resolve("CA", &GreetingTable::default()).await;

        assert_eq!(state.region, "CA");
        assert_eq!(state.content.as_deref(), Some("Bonjour du Canada!"));
    }

    #[tokio::test]
    async fn test_geocode_failure_is_terminal_error() {
        let geocoder = StaticGeocoder::failing();
        let resolver = RegionResolver::new(paris_fix(), geocoder);

        let state = resolver.resolve("US", &GreetingTable::default()).await;

        assert!(!state.loading);
        assert_eq!(state.region, "US");
        assert!(state.content.is_none());
        assert!(matches!(
            state.error.as_deref(),
            Some(ResolveError::Geocode(GeocodeError::Parse(_)))
        ));
    }

    #[tokio::test]
    async fn test_content_failure_is_terminal_error() {
        let resolver = RegionResolver::new(None, StaticGeocoder::failing());
        let source = content_fn(|_region: String| async {
            Err::<String, _>(ContentError::unavailable("catalogue offline"))
        });

        let state = resolver.resolve("US", &source).await;

        assert!(!state.loading);
        assert!(state.content.is_none());
        assert_eq!(state.error_message().as_deref(), Some("catalogue offline"));
    }

    #[tokio::test]
    async fn test_content_source_receives_expected_region() {
        let geocoder = StaticGeocoder::answering(Some("Paris"), Some("France"), Some("FR"));
        let resolver = RegionResolver::new(paris_fix(), geocoder);
        let source = content_fn(|region: String| async move {
            Ok::<_, ContentError>(format!("asked for {}", region))
        });

        let state = resolver.resolve("US", &source).await;

        assert_eq!(state.content.as_deref(), Some("asked for FR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geolocation_timeout() {
        let resolver = RegionResolver::new(
            Some(Arc::new(HangingGeolocation)),
            StaticGeocoder::failing(),
        )
        .with_timeouts(ResolverTimeouts {
            geolocation: Some(Duration::from_secs(3)),
            ..ResolverTimeouts::unbounded()
        });

        let state = resolver.resolve("US", &GreetingTable::default()).await;

        assert!(!state.loading);
        assert!(state.content.is_none());
        assert!(matches!(
            state.error.as_deref(),
            Some(ResolveError::Timeout {
                stage: Stage::Geolocation,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_content_timeout() {
        let resolver = RegionResolver::new(None, StaticGeocoder::failing()).with_timeouts(
            ResolverTimeouts {
                content: Some(Duration::from_secs(1)),
                ..ResolverTimeouts::unbounded()
            },
        );
        let source = content_fn(|_region: String| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ContentError>("too late".to_string())
        });

        let state = resolver.resolve("US", &source).await;

        match state.error.as_deref() {
            Some(ResolveError::Timeout { stage, after }) => {
                assert_eq!(*stage, Stage::Content);
                assert_eq!(*after, Duration::from_secs(1));
            }
            other => panic!("expected content timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_timeouts_from_config() {
        let config = ResolverConfig {
            geolocation_timeout_secs: 0,
            geocode_timeout_secs: 7,
            content_timeout_secs: 2,
        };
        let timeouts = ResolverTimeouts::from_config(&config);
        assert_eq!(timeouts.geolocation, None);
        assert_eq!(timeouts.geocode, Some(Duration::from_secs(7)));
        assert_eq!(timeouts.content, Some(Duration::from_secs(2)));
    }
}
