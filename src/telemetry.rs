//! Telemetry metric name constants.
//!
//! Centralised metric names for askme operations. The daemon (or any
//! embedding application) installs its own `metrics` recorder; without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `askme_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: wire format in use ("vectara_v1", "vectara_v2")
//! - `breaker`: circuit breaker instance name
//! - `status`: outcome: "ok" or "error"

/// Total upstream calls actually dispatched to the provider.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "askme_upstream_requests_total";

/// Upstream call duration in seconds.
///
/// Labels: `provider`.
pub const UPSTREAM_DURATION_SECONDS: &str = "askme_upstream_duration_seconds";

/// Total `/api/rag` responses, by HTTP status code.
///
/// Labels: `code` (e.g. "200", "503").
pub const HTTP_RESPONSES_TOTAL: &str = "askme_http_responses_total";

/// Total handler retries after an upstream 5xx.
pub const RETRIES_TOTAL: &str = "askme_retries_total";

/// Total request-dedup cache hits.
pub const CACHE_HITS_TOTAL: &str = "askme_cache_hits_total";

/// Total request-dedup cache misses.
pub const CACHE_MISSES_TOTAL: &str = "askme_cache_misses_total";

/// Calls rejected by an open breaker without invoking the upstream.
///
/// Labels: `breaker`.
pub const BREAKER_REJECTIONS_TOTAL: &str = "askme_breaker_rejections_total";

/// Breaker state transitions.
///
/// Labels: `breaker`, `to` ("closed" | "open" | "half_open").
pub const BREAKER_TRANSITIONS_TOTAL: &str = "askme_breaker_transitions_total";
