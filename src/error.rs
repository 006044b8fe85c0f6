//! Error types and handling for the `WeatherStream` pipeline

use std::collections::HashMap;
use thiserror::Error;

/// Machine-readable classification of API failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The API rejected the key (HTTP 401/403)
    ApiUnauthorized,
    /// The requested location could not be resolved (HTTP 400/404)
    ApiLocationNotFound,
    /// Transport-level failure before a response arrived
    ApiNetworkError,
    /// The response body was not the JSON we expected
    ApiInvalidResponse,
}

/// Main error type for the `WeatherStream` pipeline
#[derive(Error, Debug)]
pub enum WeatherStreamError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Non-success HTTP response from the weather API or a sink endpoint
    #[error("HTTP error {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        body: String,
        endpoint: String,
    },

    /// API communication errors
    #[error("API error: {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// A payload lacks a field that cannot be defaulted
    #[error("Required field missing from payload: {path}")]
    MissingField { path: String },

    /// Secret resolution errors
    #[error("Secret error: {message}")]
    Secret { message: String },

    /// Event or table sink errors
    #[error("Sink error: {message}")]
    Sink { message: String },

    /// Schedule expression errors
    #[error("Schedule error: {message}")]
    Schedule { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON encoding or decoding errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl WeatherStreamError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an API error carrying a code and request context
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    /// Create an HTTP status error
    pub fn http<B: Into<String>, E: Into<String>>(status: u16, body: B, endpoint: E) -> Self {
        Self::Http {
            status,
            body: body.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn missing_field<S: Into<String>>(path: S) -> Self {
        Self::MissingField { path: path.into() }
    }

    pub fn secret<S: Into<String>>(message: S) -> Self {
        Self::Secret {
            message: message.into(),
        }
    }

    pub fn sink<S: Into<String>>(message: S) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    pub fn schedule<S: Into<String>>(message: S) -> Self {
        Self::Schedule {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// The API classification, if this is an API or HTTP failure
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { code, .. } => Some(*code),
            Self::Http { status, .. } => match status {
                401 | 403 => Some(ErrorCode::ApiUnauthorized),
                400 | 404 => Some(ErrorCode::ApiLocationNotFound),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { .. } => {
                "Configuration error. Please check your config file and secret settings.".to_string()
            }
            Self::Http { status, .. } if self.code() == Some(ErrorCode::ApiUnauthorized) => {
                format!("The weather API rejected the API key (HTTP {status}).")
            }
            Self::Http { status, .. } if self.code() == Some(ErrorCode::ApiLocationNotFound) => {
                format!("The weather API could not resolve the location (HTTP {status}).")
            }
            Self::Http { status, body, .. } => {
                format!("The weather API returned HTTP {status}: {body}")
            }
            Self::Api { .. } => {
                "Unable to reach the weather API. Please check your internet connection."
                    .to_string()
            }
            Self::MissingField { path } => {
                format!("The weather API response is missing '{path}'.")
            }
            Self::Secret { .. } => {
                "Unable to resolve the weather API key. Please check your secret provider."
                    .to_string()
            }
            Self::Sink { message } => format!("Unable to deliver the record: {message}"),
            Self::Schedule { message } => format!("Invalid schedule: {message}"),
            Self::Validation { message } => format!("Invalid input: {message}"),
            Self::Io { .. } => "File operation failed. Please check file permissions.".to_string(),
            Self::Json { .. } => "Malformed JSON payload.".to_string(),
        }
    }
}
