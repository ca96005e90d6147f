//! Sources for the user's current position
//!
//! A terminal has no platform geolocation API, so the position comes from one
//! of a few providers: fixed coordinates given on the command line, an IP
//! geolocation lookup, or nothing at all.

use futures::future::{self, BoxFuture, FutureExt};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::Coordinates;

/// Default IP geolocation endpoint (ip-api.com JSON format)
pub const DEFAULT_GEO_URL: &str = "http://ip-api.com/json";

/// Errors that can occur when determining the current position
#[derive(Debug, Error)]
pub enum GeoError {
    /// No location source is configured
    #[error("Geolocation is not supported")]
    Unsupported,

    /// Coordinates are outside the valid range
    #[error("Invalid coordinates: latitude {0}, longitude {1}")]
    InvalidCoordinates(f64, f64),

    /// HTTP request to the lookup service failed
    #[error("Location request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Lookup service could not resolve a position
    #[error("Location lookup failed: {0}")]
    LookupFailed(String),
}

/// A single-shot source of the current position
pub trait LocationProvider: Send + Sync {
    /// Whether this provider can produce a position at all
    fn is_supported(&self) -> bool {
        true
    }

    /// Resolve the current position
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeoError>>;
}

/// Provider used when no location source is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl LocationProvider for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeoError>> {
        future::ready(Err(GeoError::Unsupported)).boxed()
    }
}

/// Provider that always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    /// Create a provider for the given position, validating its range
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let lat_ok = (-90.0..=90.0).contains(&latitude);
        let lon_ok = (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(GeoError::InvalidCoordinates(latitude, longitude));
        }
        Ok(Self {
            coords: Coordinates::new(latitude, longitude),
        })
    }
}

impl LocationProvider for FixedLocation {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeoError>> {
        future::ready(Ok(self.coords)).boxed()
    }
}

/// Provider that asks an IP geolocation service for the position
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    client: Client,
    url: String,
}

/// ip-api.com style response
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    async fn lookup(&self) -> Result<Coordinates, GeoError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(GeoError::LookupFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await?;
        if body.status.as_deref() == Some("fail") {
            return Err(GeoError::LookupFailed(
                body.message.unwrap_or_else(|| "unknown reason".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(GeoError::LookupFailed("response has no coordinates".to_string())),
        }
    }
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new(DEFAULT_GEO_URL)
    }
}

impl LocationProvider for IpGeolocator {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeoError>> {
        self.lookup().boxed()
    }
}
