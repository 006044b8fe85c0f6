//! Weather API client
//!
//! Thin async client for the weatherapi.com REST endpoints used by the
//! pipeline: `current.json`, `forecast.json`, `alerts.json` and
//! `history.json`. Every call is a single request; a non-success status is
//! surfaced as [`WeatherStreamError::Http`] with the response body.

use crate::config::WeatherConfig;
use crate::location::LocationQuery;
use crate::models::{AlertWeatherResponse, CurrentWeatherResponse, ForecastWeatherResponse};
use crate::{ErrorCode, Result, WeatherStreamError};
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Weather API client for weatherapi.com
pub struct WeatherApiClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// API key sent as the `key` query parameter
    api_key: String,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig, api_key: String) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("weatherstream/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WeatherStreamError::config(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Current conditions with air quality
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn current(&self, location: &LocationQuery) -> Result<CurrentWeatherResponse> {
        self.get_json("current.json", location, &[("aqi", "yes".to_string())])
            .await
    }

    /// Current conditions without air quality, as used by the snapshot table
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn current_without_aqi(
        &self,
        location: &LocationQuery,
    ) -> Result<CurrentWeatherResponse> {
        self.get_json("current.json", location, &[("aqi", "no".to_string())])
            .await
    }

    /// Daily forecast for `days` days
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn forecast(
        &self,
        location: &LocationQuery,
        days: u32,
    ) -> Result<ForecastWeatherResponse> {
        self.get_json(
            "forecast.json",
            location,
            &[
                ("days", days.to_string()),
                ("aqi", "yes".to_string()),
                ("alerts", "no".to_string()),
            ],
        )
        .await
    }

    /// Active weather alerts
    #[instrument(skip(self, location), fields(location = %location))]
    pub async fn alerts(&self, location: &LocationQuery, days: u32) -> Result<AlertWeatherResponse> {
        self.get_json(
            "alerts.json",
            location,
            &[
                ("days", days.to_string()),
                ("aqi", "yes".to_string()),
                ("alerts", "yes".to_string()),
            ],
        )
        .await
    }

    /// Observed weather for a single past day
    #[instrument(skip(self, location, date), fields(location = %location, date = %date))]
    pub async fn history(
        &self,
        location: &LocationQuery,
        date: NaiveDate,
    ) -> Result<ForecastWeatherResponse> {
        self.get_json(
            "history.json",
            location,
            &[("dt", date.format("%Y-%m-%d").to_string())],
        )
        .await
    }

    fn endpoint_url(
        &self,
        endpoint: &str,
        location: &LocationQuery,
        params: &[(&str, String)],
    ) -> String {
        let mut url = format!(
            "{}/{}?key={}&q={}",
            self.base_url,
            endpoint,
            urlencoding::encode(&self.api_key),
            location.to_query_param()
        );
        for (name, value) in params {
            url.push('&');
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Issue one GET and decode the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        location: &LocationQuery,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint_url(endpoint, location, params);
        let context = HashMap::from([
            ("endpoint".to_string(), endpoint.to_string()),
            ("location".to_string(), location.to_string()),
        ]);
        let start_time = Instant::now();

        debug!("Requesting {} for '{}'", endpoint, location);

        // reqwest errors carry the request URL, which includes the API key
        let response = self.client.get(&url).send().await.map_err(|e| {
            let e = e.without_url();
            warn!("Network error requesting {}: {}", endpoint, e);
            WeatherStreamError::api_with_context(
                format!("Request to {endpoint} failed: {e}"),
                ErrorCode::ApiNetworkError,
                context.clone(),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("{} returned HTTP {}: {}", endpoint, status.as_u16(), body);
            return Err(WeatherStreamError::http(status.as_u16(), body, endpoint));
        }

        let payload = response.json::<T>().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse {} response: {}", endpoint, e);
            WeatherStreamError::api_with_context(
                format!("Invalid JSON received from {endpoint}"),
                ErrorCode::ApiInvalidResponse,
                context,
            )
        })?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved {} in {:.3}s",
            endpoint,
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow API response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherApiClient {
        let config = WeatherConfig {
            base_url: format!("{}/v1/", server.uri()),
            timeout_seconds: 5,
            ..WeatherConfig::default()
        };
        WeatherApiClient::new(&config, "test-key".to_string()).unwrap()
    }

    fn bangalore() -> LocationQuery {
        LocationQuery::Name("Bangalore".to_string())
    }

    #[test]
    fn test_endpoint_url_encodes_parameters() {
        let config = WeatherConfig::default();
        let client = WeatherApiClient::new(&config, "k&y".to_string()).unwrap();
        let url = client.endpoint_url(
            "forecast.json",
            &LocationQuery::Name("New York".to_string()),
            &[("days", "3".to_string())],
        );
        assert_eq!(
            url,
            "http://api.weatherapi.com/v1/forecast.json?key=k%26y&q=New%20York&days=3"
        );
    }

    #[tokio::test]
    async fn test_current_sends_key_and_aqi() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "test-key"))
            .and(query_param("q", "Bangalore"))
            .and(query_param("aqi", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": { "name": "Bangalore" },
                "current": { "temp_c": 24.0 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).current(&bangalore()).await.unwrap();
        assert_eq!(
            response.location.unwrap().name.as_deref(),
            Some("Bangalore")
        );
        assert_eq!(response.current.unwrap().temp_c, Some(24.0));
    }

    #[tokio::test]
    async fn test_forecast_and_alert_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .and(query_param("days", "3"))
            .and(query_param("alerts", "no"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "forecast": { "forecastday": [{}, {}, {}] } })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/alerts.json"))
            .and(query_param("alerts", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let forecast = client.forecast(&bangalore(), 3).await.unwrap();
        assert_eq!(forecast.forecast.unwrap().forecastday.unwrap().len(), 3);

        let alerts = client.alerts(&bangalore(), 3).await.unwrap();
        assert!(alerts.alerts.is_none());
    }

    #[tokio::test]
    async fn test_history_sends_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/history.json"))
            .and(query_param("dt", "2025-08-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        client_for(&server).history(&bangalore(), date).await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"error":{"code":2006,"message":"API key is invalid."}}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).current(&bangalore()).await.unwrap_err();
        match err {
            WeatherStreamError::Http {
                status,
                ref body,
                ref endpoint,
            } => {
                assert_eq!(status, 401);
                assert!(body.contains("API key is invalid"));
                assert_eq!(endpoint, "current.json");
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).current(&bangalore()).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiInvalidResponse));
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_api_key() {
        // nothing listens on the discard port
        let config = WeatherConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            timeout_seconds: 5,
            ..WeatherConfig::default()
        };
        let client = WeatherApiClient::new(&config, "SUPERSECRETKEY".to_string()).unwrap();

        let err = client.current(&bangalore()).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiNetworkError));
        assert!(!err.to_string().contains("SUPERSECRETKEY"), "{err}");
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
        assert!(!err.user_message().contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_decode_error_does_not_expose_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let config = WeatherConfig {
            base_url: format!("{}/v1", server.uri()),
            timeout_seconds: 5,
            ..WeatherConfig::default()
        };
        let client = WeatherApiClient::new(&config, "SUPERSECRETKEY".to_string()).unwrap();

        let err = client.forecast(&bangalore(), 3).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ApiInvalidResponse));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }
}
