//! Configuration management for the moneta CLI and SDK

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{MonetaError, Result};

/// Persisted CLI configuration, stored as JSON under the user config dir
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub endpoint: String,
    pub timeout: u64,
    pub verbose: bool,
    pub storage_dir: PathBuf,
    pub token_storage_enabled: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            timeout: 30,
            verbose: false,
            storage_dir: default_storage_dir(),
            token_storage_enabled: true,
        }
    }
}

impl CliConfig {
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file).await?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => Ok(config),
                Err(_) => {
                    // Unreadable config file is replaced with defaults
                    let config = Self::default();
                    config.save(&config_file).await?;
                    Ok(config)
                }
            }
        } else {
            let config = Self::default();
            config.save(&config_file).await?;
            Ok(config)
        }
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    /// Build the SDK-facing client config from the persisted CLI settings
    pub fn to_client_config(&self) -> ClientConfig {
        let normalized_endpoint = if self.endpoint.ends_with("/api/v1") {
            self.endpoint.clone()
        } else {
            format!("{}/api/v1", self.endpoint.trim_end_matches('/'))
        };

        let mut builder = ClientConfigBuilder::new()
            .base_url(&normalized_endpoint)
            .timeout(self.timeout)
            .verbose(self.verbose);

        if self.token_storage_enabled {
            let record_path = self.storage_dir.join("session").join("auth.rec");
            builder = builder.token_storage(TokenStorageConfig {
                enabled: true,
                storage_path: Some(record_path.to_string_lossy().to_string()),
            });
        }

        builder.build().unwrap_or_else(|_| {
            ClientConfigBuilder::new()
                .base_url("http://localhost:8000/api/v1")
                .build()
                .unwrap()
        })
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moneta")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moneta")
}

/// Persisted auth record storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TokenStorageConfig {
    #[serde(default)]
    pub enabled: bool,
    pub storage_path: Option<String>,
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    /// Server-defined access token lifetime, minutes
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    /// Server-defined refresh token lifetime, minutes
    #[serde(default = "default_refresh_token_minutes")]
    pub refresh_token_minutes: i64,
    /// Lifetime of the persisted auth record, days
    #[serde(default = "default_persisted_record_days")]
    pub persisted_record_days: i64,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
}

fn default_timeout() -> u64 {
    30
}

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_minutes() -> i64 {
    60
}

fn default_persisted_record_days() -> i64 {
    7
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout: default_timeout(),
            verbose: false,
            access_token_minutes: default_access_token_minutes(),
            refresh_token_minutes: default_refresh_token_minutes(),
            persisted_record_days: default_persisted_record_days(),
            token_storage: TokenStorageConfig::default(),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    token_storage: Option<TokenStorageConfig>,
    config_file: Option<PathBuf>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn token_storage(mut self, token_storage: TokenStorageConfig) -> Self {
        self.token_storage = Some(token_storage);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_file_and_env(self.config_file.as_deref())?;

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(token_storage) = self.token_storage {
            config.token_storage = token_storage;
        }

        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn new() -> Result<Self> {
        Self::from_file_and_env::<&str>(None)
    }

    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Layer defaults, an optional config file, and `MONETA_*` environment
    /// variables into a client config
    pub fn from_file_and_env<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", "http://localhost:8000/api/v1")?
            .set_default("timeout", 30)?
            .set_default("verbose", false)?
            .set_default("access_token_minutes", 15)?
            .set_default("refresh_token_minutes", 60)?
            .set_default("persisted_record_days", 7)?;

        if let Some(config_path) = config_file {
            if config_path.as_ref().exists() {
                builder = builder.add_source(File::from(config_path.as_ref()));
            }
        }
        builder = builder.add_source(Environment::with_prefix("MONETA").try_parsing(true));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(MonetaError::invalid_input("Base URL cannot be empty"));
        }
        if self.persisted_record_days < 1 {
            return Err(MonetaError::invalid_input(
                "Persisted record lifetime must be at least one day",
            ));
        }
        Ok(())
    }

    /// Resolve a path like `/expenses/` against the versioned API root
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joining() {
        let config = ClientConfig {
            base_url: "http://localhost:8000/api/v1/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.endpoint_url("/expenses/"),
            "http://localhost:8000/api/v1/expenses/"
        );
        assert_eq!(
            config.endpoint_url("authentication/token/"),
            "http://localhost:8000/api/v1/authentication/token/"
        );
    }

    #[test]
    fn test_cli_config_normalizes_endpoint() {
        let cli = CliConfig {
            endpoint: "http://finance.example.com/".to_string(),
            ..CliConfig::default()
        };
        let client = cli.to_client_config();
        assert_eq!(client.base_url, "http://finance.example.com/api/v1");
    }

    #[test]
    fn test_validate_rejects_empty_base_url() {
        let config = ClientConfig {
            base_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
