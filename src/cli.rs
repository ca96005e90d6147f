//! Command-line interface parsing for Skycast
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`AppConfig`].

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::app::DEFAULT_FORECAST_DAYS;
use crate::data::client::DEFAULT_API_BASE_URL;
use crate::data::geolocation::DEFAULT_GEO_URL;

/// Default debounce delay in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default cache freshness window in minutes
pub const DEFAULT_CACHE_TTL_MINS: u64 = 10;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The API base URL is not an absolute http(s) URL
    #[error("Invalid API URL: '{0}'")]
    InvalidApiUrl(String),

    /// Only one of --lat / --lon was given
    #[error("--lat and --lon must be given together")]
    IncompleteCoordinates,

    /// Coordinates are out of range
    #[error("Invalid coordinates: latitude must be within -90..=90 and longitude within -180..=180")]
    InvalidCoordinates,

    /// Forecast days outside 1..=14
    #[error("Invalid forecast days: {0}. Must be between 1 and 14")]
    InvalidForecastDays(u8),
}

/// Skycast - Current weather and forecast for any city
#[derive(Parser, Debug)]
#[command(name = "skycast")]
#[command(about = "Weather lookup with city autocomplete and a multi-day forecast")]
#[command(version)]
pub struct Cli {
    /// Base URL of the weather API
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_url: String,

    /// Delay before a typed query is sent for suggestions
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Number of forecast days to request
    #[arg(long, value_name = "DAYS", default_value_t = DEFAULT_FORECAST_DAYS)]
    pub forecast_days: u8,

    /// How long a cached weather response stays fresh
    #[arg(long, value_name = "MINUTES", default_value_t = DEFAULT_CACHE_TTL_MINS)]
    pub cache_ttl_mins: u64,

    /// Keep the cache in memory only
    #[arg(long)]
    pub no_cache_persist: bool,

    /// Directory for the weather cache (defaults to the XDG cache dir)
    #[arg(long, value_name = "DIR", conflicts_with = "no_cache_persist")]
    pub cache_dir: Option<PathBuf>,

    /// Latitude reported as the current location
    #[arg(long, value_name = "LAT", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude reported as the current location
    #[arg(long, value_name = "LON", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Resolve the current location from the public IP address
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub ip_geolocation: bool,

    /// IP geolocation endpoint (ip-api.com JSON format)
    #[arg(long, value_name = "URL", default_value = DEFAULT_GEO_URL, requires = "ip_geolocation")]
    pub geo_url: String,

    /// Write logs to this file (defaults to skycast.log in the cache dir)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Search for this city on startup
    #[arg(long, value_name = "NAME")]
    pub city: Option<String>,
}

/// Where the cache lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLocation {
    /// XDG cache directory
    Default,
    Dir(PathBuf),
    Memory,
}

/// Where "current location" comes from
#[derive(Debug, Clone, PartialEq)]
pub enum LocationSource {
    None,
    Fixed { latitude: f64, longitude: f64 },
    IpLookup { url: String },
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub debounce: Duration,
    pub forecast_days: u8,
    pub cache_ttl: Duration,
    pub cache: CacheLocation,
    pub location: LocationSource,
    pub log_file: Option<PathBuf>,
    /// City to search immediately after startup
    pub initial_city: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_BASE_URL.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            forecast_days: DEFAULT_FORECAST_DAYS,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINS * 60),
            cache: CacheLocation::Default,
            location: LocationSource::None,
            log_file: None,
            initial_city: None,
        }
    }
}

impl AppConfig {
    /// Creates an AppConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(AppConfig)` with validated settings
    /// * `Err(CliError)` if a value is out of range or inconsistent
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_url = validate_api_url(&cli.api_url)?;

        if !(1..=14).contains(&cli.forecast_days) {
            return Err(CliError::InvalidForecastDays(cli.forecast_days));
        }

        let location = match (cli.lat, cli.lon) {
            (Some(latitude), Some(longitude)) => {
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    return Err(CliError::InvalidCoordinates);
                }
                LocationSource::Fixed {
                    latitude,
                    longitude,
                }
            }
            (Some(_), None) | (None, Some(_)) => return Err(CliError::IncompleteCoordinates),
            (None, None) if cli.ip_geolocation => LocationSource::IpLookup {
                url: cli.geo_url.clone(),
            },
            (None, None) => LocationSource::None,
        };

        let cache = if cli.no_cache_persist {
            CacheLocation::Memory
        } else if let Some(dir) = &cli.cache_dir {
            CacheLocation::Dir(dir.clone())
        } else {
            CacheLocation::Default
        };

        let initial_city = cli
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(AppConfig {
            api_url,
            debounce: Duration::from_millis(cli.debounce_ms),
            forecast_days: cli.forecast_days,
            cache_ttl: Duration::from_secs(cli.cache_ttl_mins.saturating_mul(60)),
            cache,
            location,
            log_file: cli.log_file.clone(),
            initial_city,
        })
    }
}

fn validate_api_url(raw: &str) -> Result<String, CliError> {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(raw.to_string()),
        _ => Err(CliError::InvalidApiUrl(raw.to_string())),
    }
}
