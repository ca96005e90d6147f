//! Core data models for Skycast
//!
//! This module contains the data types exchanged with the weather API and the
//! clients used to fetch them.

pub mod client;
pub mod format;
pub mod geolocation;

pub use client::{ApiError, WeatherApiClient};
pub use format::{format_date, format_wind};
pub use geolocation::{FixedLocation, GeoError, IpGeolocator, LocationProvider, Unsupported};

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point-in-time weather reading for a location
///
/// Used both for current conditions and for each day of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// City name as resolved by the API
    pub city: String,
    /// Country name or code
    #[serde(default)]
    pub country: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Short condition text, e.g. "Partly cloudy"
    pub description: String,
    /// Relative humidity percentage (0-100)
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Date of the reading, ISO 8601
    #[serde(default)]
    pub date: String,
}

/// A city offered as an autocomplete match for the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

impl fmt::Display for CitySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}, {}", self.name, self.country)
        }
    }
}

/// Geographic position reported by a location provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Renders the position as the `lat,lon` location string the API accepts
    pub fn to_location(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}
