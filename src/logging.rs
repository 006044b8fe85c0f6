//! Tracing subscriber setup

use crate::config::LoggingConfig;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the configured
/// level to `debug`. Output goes to stderr so stdout carries only records.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_directive(config, verbose))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}

fn default_directive(config: &LoggingConfig, verbose: bool) -> String {
    let level = if verbose { "debug" } else { config.level.as_str() };
    // keep HTTP client internals quiet unless explicitly requested
    format!("{level},hyper_util=warn,reqwest=warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        let config = LoggingConfig::default();
        assert_eq!(
            default_directive(&config, false),
            "info,hyper_util=warn,reqwest=warn"
        );
        assert!(default_directive(&config, true).starts_with("debug,"));
    }

    #[test]
    fn test_directive_is_a_valid_filter() {
        let config = LoggingConfig {
            level: "trace".to_string(),
            format: "json".to_string(),
        };
        assert!(EnvFilter::try_new(default_directive(&config, false)).is_ok());
    }
}
