//! Vectara HTTP transport.
//!
//! Sends one POST per [`ask`](RagProvider::ask) with API-key header auth.
//! The endpoint, body and extra headers come from the configured
//! [`WireFormat`].

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::traits::RagProvider;
use super::wire::WireFormat;
use crate::telemetry;
use crate::types::{RagRequest, RagResponse};
use crate::{AskError, Result};

/// Default base URL for the Vectara API
pub const DEFAULT_BASE_URL: &str = "https://api.vectara.io";

/// Default per-call HTTP timeout. Kept below the handler's request timeout
/// so the transport gives up first and the breaker sees a clean failure.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(8);

/// Client for the Vectara RAG API.
pub struct VectaraClient {
    api_key: String,
    http: Client,
    base_url: String,
    format: Box<dyn WireFormat>,
}

impl VectaraClient {
    /// Create a client against the public API.
    pub fn new(api_key: impl Into<String>, format: Box<dyn WireFormat>) -> Result<Self> {
        Self::with_base_url(api_key, format, DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client with a custom base URL and timeout (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        format: Box<dyn WireFormat>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AskError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let api_key = api_key.into();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(
            format = format.name(),
            %base_url,
            api_key = %redact(&api_key),
            timeout_ms = timeout.as_millis() as u64,
            "vectara client configured"
        );

        Ok(Self {
            api_key,
            http,
            base_url,
            format,
        })
    }

    pub fn format(&self) -> &dyn WireFormat {
        self.format.as_ref()
    }

    async fn send(&self, request: &RagRequest) -> Result<RagResponse> {
        let url = format!("{}{}", self.base_url, self.format.path(request));
        let body = self.format.body(request)?;

        let mut builder = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&body);
        for (name, value) in self.format.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(format = self.format.name(), status = status.as_u16(), "vectara returned error status");
            return Err(AskError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        self.format.parse(&bytes)
    }
}

#[async_trait]
impl RagProvider for VectaraClient {
    fn name(&self) -> &str {
        self.format.name()
    }

    async fn ask(&self, request: &RagRequest) -> Result<RagResponse> {
        let start = Instant::now();
        let result = self.send(request).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "provider" => self.format.name(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS, "provider" => self.format.name())
            .record(start.elapsed().as_secs_f64());

        result
    }
}

impl fmt::Debug for VectaraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectaraClient")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("format", &self.format)
            .finish()
    }
}

/// Shorten every alphanumeric run longer than four characters to its first
/// four followed by an ellipsis.
pub(crate) fn redact(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(64));
    let mut run = 0usize;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            run += 1;
            if run <= 4 {
                out.push(c);
            } else if run == 5 {
                out.push('…');
            }
        } else {
            run = 0;
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_keeps_four_chars_per_run() {
        assert_eq!(redact("zqk_abcdefgh1234"), "zqk_abcd…");
        assert_eq!(redact("abc"), "abc");
        assert_eq!(redact("abcdefgh-ijklmnop"), "abcd…-ijkl…");
    }
}
