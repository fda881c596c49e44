//! Request-scoped timeout policy and the single-retry rule.
//!
//! The timeout is applied per attempt by the caller (see
//! [`RagClient::ask_with_timeout`](crate::RagClient::ask_with_timeout)), so
//! every attempt gets a fresh budget and its expiry reaches the breaker. A
//! second attempt is made only for errors that [`AskError::is_retryable`](crate::AskError::is_retryable)
//! accepts (upstream 5xx); breaker rejections, timeouts and everything else
//! return at once.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::Result;
use crate::telemetry;

/// Handler-side timing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Budget for each attempt. Default: 10s.
    pub request_timeout: Duration,
    /// Pause before the retry. Default: none.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            retry_delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Run `f`, retrying exactly once on upstream 5xx.
pub(crate) async fn with_single_retry<F, Fut, T>(policy: &RetryPolicy, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Err(e) if e.is_retryable() => {
            metrics::counter!(telemetry::RETRIES_TOTAL).increment(1);
            warn!(
                status = e.upstream_status(),
                delay_ms = policy.retry_delay.as_millis() as u64,
                "retrying after upstream server error"
            );
            if !policy.retry_delay.is_zero() {
                tokio::time::sleep(policy.retry_delay).await;
            }
            f().await
        }
        outcome => outcome,
    }
}
