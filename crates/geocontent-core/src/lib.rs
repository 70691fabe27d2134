pub mod config;
pub mod error;

pub use config::{
    Config, ContentConfig, GeocodingConfig, GeolocationConfig, GeolocationMode, ResolverConfig,
    ValidationResult,
};
pub use error::{AppError, ConfigError, GeoError, NetworkError, ReqwestErrorExt};

use anyhow::Result;

/// Initialize logging for the application.
///
/// Logs go to stderr so stdout stays free for rendered output.
/// Safe to call more than once; later calls are no-ops.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    match installed {
        Ok(()) => tracing::debug!("GeoContent core initialized"),
        Err(e) => tracing::debug!("Keeping existing tracing subscriber: {}", e),
    }
    Ok(())
}
