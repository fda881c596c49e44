//! RagClient - the single entry point for asking the provider

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{AskError, Result};
use crate::cache::TtlCache;
use crate::providers::RagProvider;
use crate::resilience::CircuitBreaker;
use crate::telemetry;
use crate::types::{RagRequest, RagResponse};

/// Cache-key prefix for requests without a conversation id. Keys for
/// requests with one start with `c:`, so no caller-supplied id can collide.
pub const NO_CONVERSATION: &str = "-";

/// De-duplicating, breaker-guarded client for a [`RagProvider`].
///
/// `ask` is a single attempt: a cache hit returns immediately, a miss makes
/// at most one upstream call through the breaker. Retry policy belongs to
/// the caller so that the breaker counts real attempts only.
///
/// Construct once at startup (see [`RagClient::builder`]) and share via
/// `Arc`; the cache and breaker are internally synchronized.
pub struct RagClient {
    provider: Arc<dyn RagProvider>,
    cache: TtlCache<Arc<RagResponse>>,
    breaker: Arc<CircuitBreaker>,
}

impl RagClient {
    pub fn builder() -> super::RagClientBuilder {
        super::RagClientBuilder::new()
    }

    pub(crate) fn new(
        provider: Arc<dyn RagProvider>,
        cache: TtlCache<Arc<RagResponse>>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            provider,
            cache,
            breaker,
        }
    }

    /// Answer a question.
    ///
    /// The query is forwarded untouched (no length checks here); only the
    /// cache key uses the trimmed form. Identical questions within the TTL
    /// return the same `Arc`.
    pub async fn ask(&self, request: &RagRequest) -> Result<Arc<RagResponse>> {
        self.answer(request, None).await
    }

    /// Like [`ask`](Self::ask), with the upstream call bounded by `limit`.
    ///
    /// The timeout runs inside the breaker, so an expiry is recorded as a
    /// failure. Dropping the returned future (a caller going away) records
    /// nothing.
    pub async fn ask_with_timeout(
        &self,
        request: &RagRequest,
        limit: Duration,
    ) -> Result<Arc<RagResponse>> {
        self.answer(request, Some(limit)).await
    }

    async fn answer(
        &self,
        request: &RagRequest,
        limit: Option<Duration>,
    ) -> Result<Arc<RagResponse>> {
        let key = cache_key(request);
        if let Some(hit) = self.cache.get(&key) {
            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
            debug!(provider = self.provider.name(), "answer served from cache");
            return Ok(hit);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);

        let provider = &self.provider;
        let response = self
            .breaker
            .execute(|| async move {
                match limit {
                    Some(limit) => tokio::time::timeout(limit, provider.ask(request))
                        .await
                        .map_err(|_| AskError::Timeout)?,
                    None => provider.ask(request).await,
                }
            })
            .await
            .map(Arc::new)?;

        self.cache.set(key, Arc::clone(&response));
        Ok(response)
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn cache(&self) -> &TtlCache<Arc<RagResponse>> {
        &self.cache
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

/// `c:{conversation id}::{trimmed query}`, or `-::{trimmed query}` without
/// a conversation.
pub fn cache_key(request: &RagRequest) -> String {
    let query = request.query.trim();
    match request.conversation_id.as_deref() {
        Some(id) => format!("c:{id}::{query}"),
        None => format!("{NO_CONVERSATION}::{query}"),
    }
}
