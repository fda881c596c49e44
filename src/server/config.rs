//! Configuration loading for askmed.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.askme/config.toml` (user)
//! 3. `/etc/askme/config.toml` (system)
//!
//! With no file present, built-in defaults apply.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.askme/secrets.toml` (user, must be 0600)
//! 2. `/etc/askme/secrets.toml` (system, must be 0600)
//!
//! and fall back to the `VECTARA_API_KEY` environment variable.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::providers::ApiVersion;
use crate::providers::vectara::DEFAULT_BASE_URL;
use crate::resilience::CircuitBreakerConfig;
use crate::types::GenerationPreset;
use crate::{AskError, RagClient, RagClientBuilder, Result};

use super::RetryPolicy;

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "VECTARA_API_KEY";

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub breaker: BreakerSection,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationSection,
}

/// HTTP listener and request policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3000).
    #[serde(default = "default_address")]
    pub address: String,
    /// Per-attempt request timeout in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Pause before the single retry, in milliseconds (default: 0).
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            request_timeout_ms: default_request_timeout_ms(),
            retry_delay_ms: 0,
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Request de-duplication cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in milliseconds (default: 5000).
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    /// Optional capacity bound (default: unbounded).
    #[serde(default)]
    pub max_entries: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            max_entries: None,
        }
    }
}

fn default_ttl_ms() -> u64 {
    5_000
}

/// Circuit breaker tuning for the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSection {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_open_ms")]
    pub open_ms: u64,
    #[serde(default = "default_half_open_successes")]
    pub half_open_successes: u32,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_ms: default_open_ms(),
            half_open_successes: default_half_open_successes(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_open_ms() -> u64 {
    15_000
}

fn default_half_open_successes() -> u32 {
    2
}

/// Upstream provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Wire format: "v1" or "v2" (default: "v2").
    #[serde(default)]
    pub api_version: ApiVersion,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Corpus key (v2) or corpus id (v1). Falls back to
    /// `VECTARA_CORPUS_KEY`, then `VECTARA_CORPUS_ID`.
    #[serde(default)]
    pub corpus_key: Option<String>,
    /// Customer id (v1). Falls back to `VECTARA_CUSTOMER_ID`.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Transport timeout per call in milliseconds (default: 8000).
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_version: ApiVersion::default(),
            base_url: default_base_url(),
            corpus_key: None,
            customer_id: None,
            http_timeout_ms: default_http_timeout_ms(),
            max_results: default_max_results(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_http_timeout_ms() -> u64 {
    8_000
}

fn default_max_results() -> u32 {
    5
}

/// Generation defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationSection {
    #[serde(default)]
    pub preset: GenerationPreset,
}

/// Secrets configuration (API key).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Otherwise the first of
    /// `~/.askme/config.toml` and `/etc/askme/config.toml` is used, or the
    /// defaults when neither exists.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AskError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AskError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(AskError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".askme").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/askme/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn cache_config(&self) -> CacheConfig {
        let mut config = CacheConfig::new().ttl(Duration::from_millis(self.cache.ttl_ms));
        if let Some(max) = self.cache.max_entries {
            config = config.max_entries(max);
        }
        config
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new()
            .failure_threshold(self.breaker.failure_threshold)
            .open_duration(Duration::from_millis(self.breaker.open_ms))
            .half_open_successes(self.breaker.half_open_successes)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .request_timeout(Duration::from_millis(self.server.request_timeout_ms))
            .retry_delay(Duration::from_millis(self.server.retry_delay_ms))
    }

    /// Corpus from config, then environment.
    pub fn corpus(&self) -> Option<String> {
        self.provider
            .corpus_key
            .clone()
            .or_else(|| std::env::var("VECTARA_CORPUS_KEY").ok())
            .or_else(|| std::env::var("VECTARA_CORPUS_ID").ok())
    }

    /// Customer id from config, then environment.
    pub fn customer_id(&self) -> Option<String> {
        self.provider
            .customer_id
            .clone()
            .or_else(|| std::env::var("VECTARA_CUSTOMER_ID").ok())
    }

    /// Client builder preloaded with every section except the API key.
    pub fn client_builder(&self) -> RagClientBuilder {
        let mut builder = RagClient::builder()
            .api_version(self.provider.api_version)
            .base_url(&self.provider.base_url)
            .max_results(self.provider.max_results)
            .http_timeout(Duration::from_millis(self.provider.http_timeout_ms))
            .preset(self.generation.preset)
            .cache(self.cache_config())
            .breaker(self.breaker_config());
        if let Some(corpus) = self.corpus() {
            builder = builder.corpus(corpus);
        }
        if let Some(id) = self.customer_id() {
            builder = builder.customer_id(id);
        }
        builder
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.askme/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/askme/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (the key may come from env).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".askme").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/askme/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Read a secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            AskError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            AskError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            AskError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(AskError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// API key from the secrets file, falling back to `VECTARA_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
    }
}
