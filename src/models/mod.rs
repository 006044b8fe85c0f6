//! Data models for the `WeatherStream` pipeline
//!
//! This module contains the data shapes organized by direction:
//! - Payload: raw, loosely populated API responses
//! - Record: the flattened record published to the event sink
//! - Summary: daily rows materialized by the table sink

pub mod payload;
pub mod record;
pub mod summary;

// Re-export all public types for convenient access
pub use payload::{AlertWeatherResponse, CurrentWeatherResponse, ForecastWeatherResponse};
pub use record::{AirQualityRecord, AlertRecord, FlattenedWeatherRecord, ForecastDayRecord};
pub use summary::DailySummary;
