//! Location query parsing
//!
//! The weather API takes a free-form `q` parameter. This module classifies
//! user input (coordinates, postal codes, place names) so obviously broken
//! input is rejected before any request is made, and renders the canonical
//! query string.

use crate::{Result, WeatherStreamError};
use std::fmt;

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, etc.)
    Name(String),
    /// Postal code
    PostalCode(String),
}

impl LocationQuery {
    /// Parse location input (coordinates, city names, postal codes)
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WeatherStreamError::validation("Location cannot be empty"));
        }

        // Try to parse as coordinates (lat,lon)
        if let Ok((lat, lon)) = Self::parse_coordinates(input) {
            return Ok(Self::Coordinates(lat, lon));
        }

        if Self::is_postal_code(input) {
            return Ok(Self::PostalCode(input.to_string()));
        }

        Ok(Self::Name(input.to_string()))
    }

    /// Render the value of the `q` query parameter, URL-encoded
    #[must_use]
    pub fn to_query_param(&self) -> String {
        urlencoding::encode(&self.to_string()).into_owned()
    }

    /// Parse coordinates from string like "12.9716,77.5946" or "12.9716 77.5946"
    fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(WeatherStreamError::validation(
                "Coordinates must be in format 'lat,lon'",
            ));
        }

        let lat = parts[0]
            .parse::<f64>()
            .map_err(|_| WeatherStreamError::validation(format!("Invalid latitude: {}", parts[0])))?;
        let lon = parts[1]
            .parse::<f64>()
            .map_err(|_| WeatherStreamError::validation(format!("Invalid longitude: {}", parts[1])))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherStreamError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherStreamError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }

        Ok((lat, lon))
    }

    /// Check if input looks like a postal code
    fn is_postal_code(input: &str) -> bool {
        let normalized = input.replace([' ', '-'], "");

        // US ZIP codes: 5 or 9 digits; Indian PIN codes: 6 digits
        if matches!(normalized.len(), 5 | 6 | 9) && normalized.chars().all(|c| c.is_ascii_digit())
        {
            return true;
        }

        // UK/Canada style: letters and digits mixed, at least one of each
        if (5..=8).contains(&normalized.len())
            && normalized.chars().all(|c| c.is_ascii_alphanumeric())
            && normalized.chars().any(|c| c.is_ascii_digit())
            && normalized.chars().any(|c| c.is_ascii_alphabetic())
            && normalized.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        {
            return true;
        }

        false
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinates(lat, lon) => write!(f, "{lat},{lon}"),
            Self::Name(name) => f.write_str(name),
            Self::PostalCode(code) => f.write_str(code),
        }
    }
}
