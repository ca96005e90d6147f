//! Weather API client
//!
//! Talks to the weather backend over three JSON endpoints:
//! `/weather/{location}`, `/forecast/{location}?days=N` and
//! `/suggestions/{query}`.

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{CitySuggestion, WeatherSnapshot};

/// Base URL used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Errors that can occur when calling the weather API
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Base URL cannot be parsed or cannot carry path segments
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),

    /// Location would resolve to a different path (`.` or `..`)
    #[error("Invalid location: '{0}'")]
    InvalidLocation(String),
}

/// Client for the weather backend
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: Url,
}

impl WeatherApiClient {
    /// Create a client for the given base URL
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client with a custom HTTP client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ApiError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    /// Fetch current conditions for a city name or `lat,lon` pair
    pub async fn fetch_weather(&self, location: &str) -> Result<WeatherSnapshot, ApiError> {
        let url = self.endpoint(&["weather", location])?;
        self.get_json(url).await
    }

    /// Fetch a daily forecast covering `days` days
    pub async fn fetch_forecast(
        &self,
        location: &str,
        days: u8,
    ) -> Result<Vec<WeatherSnapshot>, ApiError> {
        let mut url = self.endpoint(&["forecast", location])?;
        url.query_pairs_mut()
            .append_pair("days", &days.to_string());
        self.get_json(url).await
    }

    /// Fetch autocomplete matches for a partial city name
    pub async fn fetch_suggestions(&self, query: &str) -> Result<Vec<CitySuggestion>, ApiError> {
        let url = self.endpoint(&["suggestions", query])?;
        self.get_json(url).await
    }

    /// Append percent-encoded path segments to the base URL
    ///
    /// `.` and `..` are rejected since the URL parser would fold them away.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidLocation(dot.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}
