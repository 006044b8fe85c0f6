//! Configuration management for `WeatherStream`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherStreamError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `WeatherStream`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherStreamConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Where the API key comes from
    pub secrets: SecretsConfig,
    /// Event sink for flattened records
    pub sink: SinkConfig,
    /// Table sink for daily summaries
    pub table: TableConfig,
    /// Timer trigger
    pub schedule: ScheduleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for weather API
    pub base_url: String,
    /// Location polled by the scheduled trigger
    pub location: String,
    /// Days requested from the forecast and alert endpoints
    pub forecast_days: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Secret provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// One of `config`, `env`, `file`, `vault`
    pub provider: String,
    /// Inline API key for the `config` provider
    pub api_key: Option<String>,
    /// Variable read by the `env` provider
    pub env_var: String,
    /// JSON file read by the `file` provider
    pub file_path: String,
    /// Secret name in the file or vault
    pub secret_name: String,
    /// Vault base URL for the `vault` provider
    pub vault_url: Option<String>,
    /// Variable holding the vault bearer token
    pub token_env_var: String,
}

/// Event sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// One of `stdout`, `file`, `http`
    pub kind: String,
    /// Output file for the `file` sink
    pub path: String,
    /// Endpoint for the `http` sink
    pub endpoint: Option<String>,
    /// Variable holding the bearer token for the `http` sink
    pub token_env_var: Option<String>,
}

/// Table sink configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// CSV file to write; stdout when unset
    pub path: Option<String>,
}

/// Scheduled trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression, six fields with seconds or standard five fields
    pub cron: String,
    /// Run one invocation immediately on start
    pub run_on_startup: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

fn default_weather_location() -> String {
    "Bangalore".to_string()
}

fn default_forecast_days() -> u32 {
    3
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_secret_provider() -> String {
    "env".to_string()
}

fn default_secret_env_var() -> String {
    "WEATHER_API_KEY".to_string()
}

fn default_secret_file_path() -> String {
    "secrets.json".to_string()
}

fn default_secret_name() -> String {
    "weather_api_key".to_string()
}

fn default_vault_token_env_var() -> String {
    "VAULT_ACCESS_TOKEN".to_string()
}

fn default_sink_kind() -> String {
    "stdout".to_string()
}

fn default_sink_path() -> String {
    "weather_events.jsonl".to_string()
}

fn default_cron() -> String {
    "0/30 * * * * *".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            location: default_weather_location(),
            forecast_days: default_forecast_days(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            provider: default_secret_provider(),
            api_key: None,
            env_var: default_secret_env_var(),
            file_path: default_secret_file_path(),
            secret_name: default_secret_name(),
            vault_url: None,
            token_env_var: default_vault_token_env_var(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: default_sink_kind(),
            path: default_sink_path(),
            endpoint: None,
            token_env_var: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: default_cron(),
            run_on_startup: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl WeatherStreamConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = &config_path {
            if !path.exists() {
                return Err(WeatherStreamError::config(format!(
                    "Config file not found: {}",
                    path.display()
                ))
                .into());
            }
        }

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. WEATHERSTREAM_WEATHER__LOCATION=London
        builder = builder.add_source(
            Environment::with_prefix("WEATHERSTREAM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherStreamConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherstream").join("config.toml"))
    }

    /// Apply default values to fields left empty by a file or environment
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.location.trim().is_empty() {
            self.weather.location = default_weather_location();
        }
        if self.weather.forecast_days == 0 {
            self.weather.forecast_days = default_forecast_days();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.secrets.provider.is_empty() {
            self.secrets.provider = default_secret_provider();
        }
        if self.secrets.secret_name.is_empty() {
            self.secrets.secret_name = default_secret_name();
        }
        if self.sink.kind.is_empty() {
            self.sink.kind = default_sink_kind();
        }
        if self.schedule.cron.trim().is_empty() {
            self.schedule.cron = default_cron();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_secrets()?;
        self.validate_sink()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the selected secret provider has what it needs
    pub fn validate_secrets(&self) -> Result<()> {
        match self.secrets.provider.as_str() {
            "config" => match &self.secrets.api_key {
                Some(key) if !key.trim().is_empty() => Ok(()),
                _ => Err(WeatherStreamError::config(
                    "secrets.provider is 'config' but secrets.api_key is not set",
                )
                .into()),
            },
            "env" if self.secrets.env_var.is_empty() => Err(WeatherStreamError::config(
                "secrets.env_var cannot be empty for the 'env' provider",
            )
            .into()),
            "file" if self.secrets.file_path.is_empty() => Err(WeatherStreamError::config(
                "secrets.file_path cannot be empty for the 'file' provider",
            )
            .into()),
            "vault" if self.secrets.vault_url.is_none() => Err(WeatherStreamError::config(
                "secrets.vault_url is required for the 'vault' provider",
            )
            .into()),
            "env" | "file" | "vault" => Ok(()),
            other => Err(WeatherStreamError::config(format!(
                "Invalid secret provider '{other}'. Must be one of: config, env, file, vault"
            ))
            .into()),
        }
    }

    /// Validate the event sink selection
    fn validate_sink(&self) -> Result<()> {
        match self.sink.kind.as_str() {
            "stdout" => Ok(()),
            "file" if self.sink.path.is_empty() => {
                Err(WeatherStreamError::config("sink.path cannot be empty for the 'file' sink").into())
            }
            "file" => Ok(()),
            "http" => match &self.sink.endpoint {
                Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
                _ => Err(WeatherStreamError::config(
                    "sink.endpoint must be an HTTP or HTTPS URL for the 'http' sink",
                )
                .into()),
            },
            other => Err(WeatherStreamError::config(format!(
                "Invalid sink kind '{other}'. Must be one of: stdout, file, http"
            ))
            .into()),
        }
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                WeatherStreamError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        // weatherapi.com serves at most 14 days of forecast
        if self.weather.forecast_days > 14 {
            return Err(
                WeatherStreamError::config("Forecast days cannot exceed 14").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherStreamError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherStreamError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.weather.base_url.starts_with("http://")
            && !self.weather.base_url.starts_with("https://")
        {
            return Err(WeatherStreamError::config(
                "Weather API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}
