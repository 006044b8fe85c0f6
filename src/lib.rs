//! `WeatherStream` - poll a weather API and forward flattened records
//!
//! This library fetches current conditions, forecast and alerts for a
//! location, merges them into one flat record, and hands the result to an
//! event sink or a table.

pub mod api;
pub mod config;
pub mod error;
pub mod flatten;
pub mod location;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod secrets;
pub mod sink;

// Re-export core types for public API
pub use api::WeatherApiClient;
pub use config::WeatherStreamConfig;
pub use error::{ErrorCode, WeatherStreamError};
pub use flatten::flatten;
pub use location::LocationQuery;
pub use models::{DailySummary, FlattenedWeatherRecord};
pub use pipeline::WeatherPipeline;
pub use scheduler::TimerSchedule;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherStreamError>;
