//! Event sinks for flattened records
//!
//! Each publish call serializes one record to JSON and ships it as a batch
//! holding that single event.

use crate::config::SinkConfig;
use crate::models::FlattenedWeatherRecord;
use crate::{Result, WeatherStreamError};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Destination for flattened records
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Publish one record as a single-event batch
    async fn publish(&self, record: &FlattenedWeatherRecord) -> Result<()>;
}

/// Build the publisher selected in configuration
pub fn from_config(config: &SinkConfig) -> Result<Box<dyn EventPublisher>> {
    let publisher: Box<dyn EventPublisher> = match config.kind.as_str() {
        "stdout" => Box::new(StdoutPublisher),
        "file" => Box::new(FilePublisher::new(&config.path)),
        "http" => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                WeatherStreamError::config("sink.endpoint is required for the 'http' sink")
            })?;
            let token = match &config.token_env_var {
                Some(var) => Some(std::env::var(var).map_err(|_| {
                    WeatherStreamError::config(format!("sink token variable {var} is not set"))
                })?),
                None => None,
            };
            Box::new(HttpPublisher::new(endpoint, token)?)
        }
        other => {
            return Err(WeatherStreamError::config(format!(
                "Invalid sink kind '{other}'"
            )));
        }
    };
    Ok(publisher)
}

/// Writes each event as one JSON line on stdout
pub struct StdoutPublisher;

#[async_trait]
impl EventPublisher for StdoutPublisher {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn publish(&self, record: &FlattenedWeatherRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&line).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Appends each event as one JSON line to a file
pub struct FilePublisher {
    path: PathBuf,
}

impl FilePublisher {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }
}

#[async_trait]
impl EventPublisher for FilePublisher {
    fn name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self, record), fields(path = %self.path.display()))]
    async fn publish(&self, record: &FlattenedWeatherRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                WeatherStreamError::sink(format!("cannot open {}: {e}", self.path.display()))
            })?;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!("Appended {} bytes", line.len());
        Ok(())
    }
}

/// POSTs a JSON array holding the single event to an ingestion endpoint
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpPublisher {
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| WeatherStreamError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
        })
    }
}

#[async_trait]
impl EventPublisher for HttpPublisher {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, record), fields(endpoint = %self.endpoint))]
    async fn publish(&self, record: &FlattenedWeatherRecord) -> Result<()> {
        let batch = serde_json::to_vec(&[record])?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(batch);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WeatherStreamError::sink(format!("publish request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherStreamError::http(
                status.as_u16(),
                body,
                self.endpoint.clone(),
            ));
        }

        info!("Published 1 event (HTTP {})", status.as_u16());
        Ok(())
    }
}
