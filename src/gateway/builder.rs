//! Builder for configuring client instances

use std::sync::Arc;
use std::time::Duration;

use super::RagClient;
use crate::cache::{CacheConfig, TtlCache};
use crate::providers::vectara::{DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT};
use crate::providers::wire::{DEFAULT_MAX_RESULTS, WireSettings};
use crate::providers::{ApiVersion, RagProvider, VectaraClient};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig};
use crate::types::GenerationPreset;
use crate::{AskError, Result};

/// Name of the breaker guarding the default provider.
const DEFAULT_BREAKER_NAME: &str = "vectara";

/// Builder for [`RagClient`].
///
/// Either inject a ready [`RagProvider`] with [`provider`](Self::provider),
/// or describe a Vectara corpus with [`vectara`](Self::vectara) and friends.
///
/// ```rust,no_run
/// # use askme::{RagClient, ApiVersion};
/// # fn main() -> askme::Result<()> {
/// let client = RagClient::builder()
///     .vectara("zqk_your_key")
///     .api_version(ApiVersion::V2)
///     .corpus("resume")
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct RagClientBuilder {
    provider: Option<Arc<dyn RagProvider>>,
    vectara_key: Option<String>,
    api_version: ApiVersion,
    base_url: String,
    corpus: Option<String>,
    customer_id: Option<String>,
    max_results: u32,
    preset: GenerationPreset,
    http_timeout: Duration,
    cache: CacheConfig,
    breaker_name: String,
    breaker: CircuitBreakerConfig,
}

impl RagClientBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            vectara_key: None,
            api_version: ApiVersion::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            corpus: None,
            customer_id: None,
            max_results: DEFAULT_MAX_RESULTS,
            preset: GenerationPreset::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            cache: CacheConfig::default(),
            breaker_name: DEFAULT_BREAKER_NAME.to_string(),
            breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Use a custom provider. Takes precedence over Vectara settings.
    pub fn provider(mut self, provider: Arc<dyn RagProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Configure the Vectara provider with the given API key.
    pub fn vectara(mut self, api_key: impl Into<String>) -> Self {
        self.vectara_key = Some(api_key.into());
        self
    }

    /// Select the provider API version (default: v2).
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = version;
        self
    }

    /// Override the provider base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Corpus to search (v1 corpus id or v2 corpus key).
    pub fn corpus(mut self, corpus: impl Into<String>) -> Self {
        self.corpus = Some(corpus.into());
        self
    }

    /// Customer id header (v1 only).
    pub fn customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }

    pub fn max_results(mut self, n: u32) -> Self {
        self.max_results = n;
        self
    }

    /// Base generation profile for v2 requests.
    pub fn preset(mut self, preset: GenerationPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Transport-level timeout per upstream call.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    pub fn breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = config;
        self
    }

    pub fn breaker_name(mut self, name: impl Into<String>) -> Self {
        self.breaker_name = name.into();
        self
    }

    pub fn build(self) -> Result<RagClient> {
        if self.breaker.failure_threshold == 0 {
            return Err(AskError::Configuration(
                "breaker failure_threshold must be at least 1".into(),
            ));
        }
        if self.breaker.half_open_successes == 0 {
            return Err(AskError::Configuration(
                "breaker half_open_successes must be at least 1".into(),
            ));
        }

        let provider: Arc<dyn RagProvider> = match (self.provider, self.vectara_key) {
            (Some(provider), _) => provider,
            (None, Some(key)) => {
                let corpus = self.corpus.ok_or_else(|| {
                    AskError::Configuration("vectara provider requires a corpus".into())
                })?;
                let mut settings = WireSettings::new(corpus)
                    .max_results(self.max_results)
                    .generation(self.preset.config());
                if let Some(id) = self.customer_id {
                    settings = settings.customer_id(id);
                }
                let format = self.api_version.format(settings);
                Arc::new(VectaraClient::with_base_url(
                    key,
                    format,
                    self.base_url,
                    self.http_timeout,
                )?)
            }
            (None, None) => {
                return Err(AskError::Configuration("no provider configured".into()));
            }
        };

        let cache = TtlCache::with_config(&self.cache);
        let breaker = Arc::new(CircuitBreaker::new(self.breaker_name, self.breaker));
        Ok(RagClient::new(provider, cache, breaker))
    }
}

impl Default for RagClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
