//! API key resolution
//!
//! The weather API key never lives in code. A [`SecretProvider`] resolves it
//! at the start of each invocation from one of: the config file, an
//! environment variable, a JSON secrets file, or a key vault's REST API.
//! Obtaining the vault bearer token is left to the surrounding environment
//! (managed identity, CLI login) which exports it in a variable.

use crate::config::SecretsConfig;
use crate::{Result, WeatherStreamError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Vault REST API version sent with every secret lookup
const VAULT_API_VERSION: &str = "7.4";

/// Resolves the weather API key
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch the secret value
    async fn resolve(&self) -> Result<String>;
}

/// Build the provider selected in configuration
pub fn from_config(config: &SecretsConfig) -> Result<Box<dyn SecretProvider>> {
    let provider: Box<dyn SecretProvider> = match config.provider.as_str() {
        "config" => Box::new(StaticSecret::new(
            config.api_key.clone().unwrap_or_default(),
        )),
        "env" => Box::new(EnvSecret::new(&config.env_var)),
        "file" => Box::new(FileSecret::new(&config.file_path, &config.secret_name)),
        "vault" => {
            let vault_url = config.vault_url.as_deref().ok_or_else(|| {
                WeatherStreamError::config("secrets.vault_url is required for the 'vault' provider")
            })?;
            Box::new(VaultSecret::new(
                vault_url,
                &config.secret_name,
                &config.token_env_var,
            )?)
        }
        other => {
            return Err(WeatherStreamError::config(format!(
                "Invalid secret provider '{other}'"
            )));
        }
    };
    Ok(provider)
}

fn non_empty(value: String, origin: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(WeatherStreamError::secret(format!("{origin} is empty")))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Key given inline in configuration
pub struct StaticSecret {
    value: String,
}

impl StaticSecret {
    pub fn new(value: String) -> Self {
        Self { value }
    }
}

#[async_trait]
impl SecretProvider for StaticSecret {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn resolve(&self) -> Result<String> {
        non_empty(self.value.clone(), "secrets.api_key")
    }
}

/// Key read from an environment variable
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

#[async_trait]
impl SecretProvider for EnvSecret {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn resolve(&self) -> Result<String> {
        let value = std::env::var(&self.var).map_err(|_| {
            WeatherStreamError::secret(format!("environment variable {} is not set", self.var))
        })?;
        non_empty(value, &format!("environment variable {}", self.var))
    }
}

/// Key read from a flat JSON object, e.g. `{"weather_api_key": "..."}`
pub struct FileSecret {
    path: PathBuf,
    key: String,
}

impl FileSecret {
    pub fn new(path: &str, key: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl SecretProvider for FileSecret {
    fn name(&self) -> &'static str {
        "file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn resolve(&self) -> Result<String> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            WeatherStreamError::secret(format!(
                "cannot read secrets file {}: {e}",
                self.path.display()
            ))
        })?;
        let secrets: HashMap<String, serde_json::Value> = serde_json::from_str(&contents)
            .map_err(|e| {
                WeatherStreamError::secret(format!(
                    "secrets file {} is not a JSON object: {e}",
                    self.path.display()
                ))
            })?;
        let value = secrets
            .get(&self.key)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                WeatherStreamError::secret(format!(
                    "secrets file {} has no string entry '{}'",
                    self.path.display(),
                    self.key
                ))
            })?;
        non_empty(value.to_string(), &format!("secret '{}'", self.key))
    }
}

/// Key fetched from a key vault's REST API
pub struct VaultSecret {
    client: reqwest::Client,
    vault_url: String,
    secret_name: String,
    token_env_var: String,
}

#[derive(Debug, Deserialize)]
struct VaultSecretBundle {
    value: Option<String>,
}

impl VaultSecret {
    pub fn new(vault_url: &str, secret_name: &str, token_env_var: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| WeatherStreamError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            vault_url: vault_url.trim_end_matches('/').to_string(),
            secret_name: secret_name.to_string(),
            token_env_var: token_env_var.to_string(),
        })
    }

    fn secret_url(&self) -> String {
        format!(
            "{}/secrets/{}?api-version={}",
            self.vault_url,
            urlencoding::encode(&self.secret_name),
            VAULT_API_VERSION
        )
    }
}

#[async_trait]
impl SecretProvider for VaultSecret {
    fn name(&self) -> &'static str {
        "vault"
    }

    #[instrument(skip(self), fields(vault = %self.vault_url, secret = %self.secret_name))]
    async fn resolve(&self) -> Result<String> {
        let token = std::env::var(&self.token_env_var).map_err(|_| {
            WeatherStreamError::secret(format!(
                "vault token variable {} is not set",
                self.token_env_var
            ))
        })?;

        debug!("Fetching secret from vault");
        let response = self
            .client
            .get(self.secret_url())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| WeatherStreamError::secret(format!("vault request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherStreamError::secret(format!(
                "vault returned HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let bundle: VaultSecretBundle = response
            .json()
            .await
            .map_err(|e| WeatherStreamError::secret(format!("invalid vault response: {e}")))?;
        let value = bundle.value.ok_or_else(|| {
            WeatherStreamError::secret(format!("vault secret '{}' has no value", self.secret_name))
        })?;
        non_empty(value, &format!("vault secret '{}'", self.secret_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_secret() {
        let provider = StaticSecret::new("  abc123  ".to_string());
        assert_eq!(provider.resolve().await.unwrap(), "abc123");

        let empty = StaticSecret::new(String::new());
        assert!(matches!(
            empty.resolve().await.unwrap_err(),
            WeatherStreamError::Secret { .. }
        ));
    }

    #[tokio::test]
    async fn test_env_secret_missing_variable() {
        let provider = EnvSecret::new("WEATHERSTREAM_TEST_SURELY_UNSET_VARIABLE");
        let err = provider.resolve().await.unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }

    #[tokio::test]
    async fn test_file_secret() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weather_api_key": "file-key", "other": 1}}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let provider = FileSecret::new(path, "weather_api_key");
        assert_eq!(provider.resolve().await.unwrap(), "file-key");

        let wrong_type = FileSecret::new(path, "other");
        assert!(wrong_type.resolve().await.is_err());

        let missing = FileSecret::new(path, "absent");
        assert!(missing.resolve().await.is_err());
    }

    #[tokio::test]
    async fn test_file_secret_unreadable() {
        let provider = FileSecret::new("/nonexistent/secrets.json", "weather_api_key");
        let err = provider.resolve().await.unwrap_err();
        assert!(err.to_string().contains("cannot read secrets file"));
    }

    #[tokio::test]
    async fn test_vault_secret() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/secrets/weatherapilatest"))
            .and(query_param("api-version", VAULT_API_VERSION))
            .and(header("authorization", "Bearer vault-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": "vault-key",
                "id": "https://vault/secrets/weatherapilatest/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        // SAFETY: Test environment, variable name is unique to this test
        unsafe {
            std::env::set_var("WEATHERSTREAM_TEST_VAULT_TOKEN", "vault-token");
        }
        let provider = VaultSecret::new(
            &server.uri(),
            "weatherapilatest",
            "WEATHERSTREAM_TEST_VAULT_TOKEN",
        )
        .unwrap();
        let value = provider.resolve().await;
        // SAFETY: Test cleanup
        unsafe {
            std::env::remove_var("WEATHERSTREAM_TEST_VAULT_TOKEN");
        }

        assert_eq!(value.unwrap(), "vault-key");
    }

    #[tokio::test]
    async fn test_vault_secret_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&server)
            .await;

        // SAFETY: Test environment, variable name is unique to this test
        unsafe {
            std::env::set_var("WEATHERSTREAM_TEST_VAULT_TOKEN_403", "token");
        }
        let provider =
            VaultSecret::new(&server.uri(), "weatherapilatest", "WEATHERSTREAM_TEST_VAULT_TOKEN_403")
                .unwrap();
        let err = provider.resolve().await.unwrap_err();
        // SAFETY: Test cleanup
        unsafe {
            std::env::remove_var("WEATHERSTREAM_TEST_VAULT_TOKEN_403");
        }

        assert!(err.to_string().contains("HTTP 403"));
    }

    #[test]
    fn test_from_config_selects_provider() {
        let mut config = SecretsConfig::default();
        assert_eq!(from_config(&config).unwrap().name(), "env");

        config.provider = "file".to_string();
        assert_eq!(from_config(&config).unwrap().name(), "file");

        config.provider = "vault".to_string();
        assert!(from_config(&config).is_err());
        config.vault_url = Some("https://kv-weather.vault.azure.net/".to_string());
        assert_eq!(from_config(&config).unwrap().name(), "vault");

        config.provider = "keychain".to_string();
        assert!(from_config(&config).is_err());
    }
}
