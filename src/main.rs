use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use geocontent_core::{Config, GeolocationMode};
use geocontent_geo::{
    Coordinates, DeniedGeolocation, FixedPosition, GeocodeXyzClient, GeolocationProvider,
    IpGeolocation,
};
use geocontent_resolver::{render, GeoContent, GreetingTable, RegionResolver, ResolverTimeouts};

/// GeoContent: show content for the region you are in.
///
/// Finds a position, reverse geocodes it to a region and prints the
/// greeting for that region. Without a position the default region is used.
///
/// Examples:
///   geocontent
///   geocontent --region CA
///   geocontent --lat 48.8566 --lon 2.3522
///   geocontent --ip --json
#[derive(Parser)]
#[command(name = "geocontent", version, about, long_about = None)]
struct Cli {
    /// Default region code (overrides config and GEOCONTENT_DEFAULT_REGION).
    #[arg(long, short = 'r')]
    region: Option<String>,

    /// Latitude of a fixed position (-90 to 90).
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude of a fixed position (-180 to 180).
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Locate via IP geolocation.
    #[arg(long, conflicts_with_all = ["lat", "deny", "no_geolocation"])]
    ip: bool,

    /// Act as if the user refused location access.
    #[arg(long, conflicts_with_all = ["lat", "no_geolocation"])]
    deny: bool,

    /// Act as if no location capability exists.
    #[arg(long, conflicts_with = "lat")]
    no_geolocation: bool,

    /// Base URL of the reverse geocoding service.
    #[arg(long)]
    geocode_url: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,

    /// Path to the config file.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

impl Cli {
    /// Fold command line overrides into the loaded config.
    fn apply(&self, config: &mut Config) {
        config.apply_region_override(self.region.clone());

        if let Some(url) = &self.geocode_url {
            config.geocoding.base_url = url.clone();
        }

        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.geolocation.mode = GeolocationMode::Fixed;
            config.geolocation.latitude = Some(lat);
            config.geolocation.longitude = Some(lon);
        } else if self.ip {
            config.geolocation.mode = GeolocationMode::Ip;
        } else if self.deny {
            config.geolocation.mode = GeolocationMode::Denied;
        } else if self.no_geolocation {
            config.geolocation.mode = GeolocationMode::None;
        }
    }
}

/// Load the config file, fold in the flags, then validate the result.
///
/// Validation runs last so a flag can replace a bad value from the file.
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_at(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.ensure_valid()?;
    Ok(config)
}

fn geolocation_provider(config: &Config) -> Result<Option<Arc<dyn GeolocationProvider>>> {
    let geo = &config.geolocation;
    let provider: Arc<dyn GeolocationProvider> = match geo.mode {
        GeolocationMode::None => return Ok(None),
        GeolocationMode::Denied => Arc::new(DeniedGeolocation),
        GeolocationMode::Ip => Arc::new(
            IpGeolocation::with_url(&geo.ip_url, &config.geocoding.user_agent)
                .context("Failed to create IP geolocation client")?,
        ),
        GeolocationMode::Fixed => {
            let (Some(lat), Some(lon)) = (geo.latitude, geo.longitude) else {
                anyhow::bail!("Fixed geolocation requires both latitude and longitude");
            };
            Arc::new(FixedPosition::new(Coordinates::new(lat, lon)))
        }
    };

    tracing::debug!("Using {} geolocation", provider.name());
    Ok(Some(provider))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    geocontent_core::init()?;

    let config = build_config(&cli)?;

    let geocoder =
        GeocodeXyzClient::with_base_url(&config.geocoding.base_url, &config.geocoding.user_agent)
            .context("Failed to create geocoding client")?;
    let resolver = RegionResolver::new(geolocation_provider(&config)?, Arc::new(geocoder))
        .with_timeouts(ResolverTimeouts::from_config(&config.resolver));
    let greetings = GreetingTable::with_overrides(config.content.greetings.clone());

    tracing::info!(default_region = %config.default_region, "GeoContent started");

    let driver = GeoContent::new(resolver, &config.default_region, Arc::new(greetings));
    let state = driver.settled().await;
    let view = render(&state);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("{}", view);
    }

    match &state.error {
        Some(err) => {
            tracing::error!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
