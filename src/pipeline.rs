//! Invocation flows
//!
//! Each flow runs its requests strictly one after another: the snapshot
//! fetches current, forecast and alerts in that order before flattening, and
//! the history range walks its dates in order, aborting on the first failure.

use crate::api::WeatherApiClient;
use crate::config::WeatherConfig;
use crate::flatten::{flatten, summarize_current, summarize_history};
use crate::location::LocationQuery;
use crate::models::{DailySummary, FlattenedWeatherRecord};
use crate::secrets::SecretProvider;
use crate::sink::EventPublisher;
use crate::{Result, WeatherStreamError};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

/// Fetch-and-reshape flows bound to one API client
pub struct WeatherPipeline {
    api: WeatherApiClient,
    forecast_days: u32,
}

impl WeatherPipeline {
    pub fn new(api: WeatherApiClient, forecast_days: u32) -> Self {
        Self { api, forecast_days }
    }

    /// Resolve the API key and build a pipeline for this invocation
    pub async fn connect(config: &WeatherConfig, secrets: &dyn SecretProvider) -> Result<Self> {
        debug!("Resolving API key via '{}' provider", secrets.name());
        let api_key = secrets.resolve().await?;
        let api = WeatherApiClient::new(config, api_key)?;
        Ok(Self::new(api, config.forecast_days))
    }

    /// Fetch current, forecast and alerts, then flatten them into one record
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn fetch_snapshot(&self, location: &LocationQuery) -> Result<FlattenedWeatherRecord> {
        let current = self.api.current(location).await?;
        let forecast = self.api.forecast(location, self.forecast_days).await?;
        let alerts = self.api.alerts(location, self.forecast_days).await?;

        let record = flatten(&current, &forecast, &alerts)?;
        debug!(
            "Flattened snapshot with {} forecast days and {} alerts",
            record.forecast.len(),
            record.alerts.len()
        );
        Ok(record)
    }

    /// Fetch a snapshot and hand it to the event sink
    pub async fn publish_snapshot(
        &self,
        location: &LocationQuery,
        publisher: &dyn EventPublisher,
    ) -> Result<FlattenedWeatherRecord> {
        let record = self.fetch_snapshot(location).await?;
        publisher.publish(&record).await?;
        info!(
            "Published snapshot for '{}' via {}",
            record.name.as_deref().unwrap_or("unknown"),
            publisher.name()
        );
        Ok(record)
    }

    /// Current conditions as a single table row
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn current_summary(&self, location: &LocationQuery) -> Result<DailySummary> {
        let response = self.api.current_without_aqi(location).await?;
        let row = summarize_current(&response)?;
        info!("Current weather: {}", row.format_temperature());
        Ok(row)
    }

    /// One table row per day in `[start, end)`
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn history_range(
        &self,
        location: &LocationQuery,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        let dates = date_range(start, end)?;
        let mut rows = Vec::with_capacity(dates.len());

        for date in dates {
            let response = self.api.history(location, date).await?;
            let day = date.format("%Y-%m-%d").to_string();
            let row = summarize_history(&day, &response)?;
            debug!("{}: {}", day, row.format_temperature());
            rows.push(row);
        }

        info!("Collected {} history rows", rows.len());
        Ok(rows)
    }
}

/// Dates from `start` inclusive to `end` exclusive
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(WeatherStreamError::validation(format!(
            "start date {start} is after end date {end}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d < end).collect())
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        WeatherStreamError::validation(format!("Invalid date '{input}', expected YYYY-MM-DD"))
    })
}
