//! Failure isolation for upstream dependencies.
//!
//! One [`CircuitBreaker`] guards one upstream. The breaker is a plain value
//! constructed at startup and shared by reference (usually behind an `Arc`);
//! there is no global registry.

mod circuit_breaker;

pub use circuit_breaker::CircuitBreaker;

use std::time::Duration;

use serde::Serialize;

/// Breaker tuning for a single upstream.
///
/// ```rust
/// # use askme::resilience::CircuitBreakerConfig;
/// # use std::time::Duration;
/// let config = CircuitBreakerConfig::new()
///     .failure_threshold(5)
///     .open_duration(Duration::from_secs(30))
///     .half_open_successes(1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures (while closed) that trip the breaker. Default: 3.
    pub failure_threshold: u32,
    /// How long the breaker stays open before admitting probes. Default: 15s.
    pub open_duration: Duration,
    /// Consecutive half-open successes needed to close again. Default: 2.
    pub half_open_successes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_duration: Duration::from_secs(15),
            half_open_successes: 2,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    pub fn open_duration(mut self, d: Duration) -> Self {
        self.open_duration = d;
        self
    }

    pub fn half_open_successes(mut self, n: u32) -> Self {
        self.half_open_successes = n;
        self
    }
}

/// Breaker operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, every call passes through.
    Closed,
    /// Failing fast, calls are rejected without running.
    Open,
    /// Cooldown elapsed, calls run as recovery probes.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Consistent view of a breaker's state and counters, taken under one lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub half_open_successes: u32,
}

/// Rejection synthesized by an open breaker.
///
/// Distinct from whatever error the guarded operation produces; callers
/// convert it into their own error type via `From`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker '{name}' is open")]
pub struct CircuitOpen {
    pub name: String,
}
