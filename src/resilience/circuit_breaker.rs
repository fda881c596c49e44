//! Three-state circuit breaker.
//!
//! ```text
//! Closed   --failure_threshold consecutive failures-->  Open
//! Open     --open_duration elapsed, checked on call-->  HalfOpen
//! HalfOpen --half_open_successes successes---------->  Closed
//! HalfOpen --any failure---------------------------->  Open (fresh timer)
//! ```
//!
//! The Open → HalfOpen transition is evaluated lazily when a call arrives;
//! there is no background timer. All state lives behind a single mutex so
//! every caller observes a consistent `(state, counters)` tuple. The lock is
//! never held across the guarded future.
//!
//! Every admission is stamped with the breaker's current epoch, which moves
//! on each state transition. An outcome is only recorded if the epoch is
//! unchanged when it arrives, so a slow call admitted before a trip cannot
//! count towards a later half-open trial. A call whose future is dropped
//! before it completes records nothing; timeouts that should count must run
//! inside the guarded operation.

use std::future::Future;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{BreakerSnapshot, CircuitBreakerConfig, CircuitOpen, CircuitState};
use crate::telemetry;

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    half_open_successes: u32,
    opened_at: Option<Instant>,
    epoch: u64,
}

/// Failure-isolation guard around a single upstream dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        debug!(
            breaker = %name,
            failure_threshold = config.failure_threshold,
            open_ms = config.open_duration.as_millis() as u64,
            half_open_successes = config.half_open_successes,
            "circuit breaker initialized"
        );
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                half_open_successes: 0,
                opened_at: None,
                epoch: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Stored state. An open breaker whose cooldown has elapsed still
    /// reports `Open` until the next call moves it to `HalfOpen`.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            half_open_successes: inner.half_open_successes,
        }
    }

    /// Run `operation` under breaker protection.
    ///
    /// While open, returns `E::from(CircuitOpen)` without calling
    /// `operation`. Otherwise the operation's own result is returned
    /// unchanged after the outcome has been recorded.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<CircuitOpen>,
    {
        let epoch = self.admit().map_err(E::from)?;

        let result = operation().await;
        if result.is_ok() {
            self.record_success(epoch);
        } else {
            self.record_failure(epoch);
        }
        result
    }

    /// Force the breaker closed and zero its counters.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.close(&mut inner);
    }

    /// Admit a call, returning the epoch its outcome belongs to.
    fn admit(&self) -> Result<u64, CircuitOpen> {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return Ok(inner.epoch);
        }

        let cooled_down = inner
            .opened_at
            .is_none_or(|at| at.elapsed() >= self.config.open_duration);
        if !cooled_down {
            metrics::counter!(telemetry::BREAKER_REJECTIONS_TOTAL, "breaker" => self.name.clone())
                .increment(1);
            debug!(breaker = %self.name, "call rejected, circuit open");
            return Err(CircuitOpen {
                name: self.name.clone(),
            });
        }

        inner.state = CircuitState::HalfOpen;
        inner.half_open_successes = 0;
        inner.epoch += 1;
        self.transitioned(CircuitState::HalfOpen);
        info!(breaker = %self.name, "circuit half-open, probing upstream");
        Ok(inner.epoch)
    }

    fn record_success(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(breaker = %self.name, "ignoring success from an earlier state");
            return;
        }
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                inner.half_open_successes += 1;
                if inner.half_open_successes >= self.config.half_open_successes {
                    self.close(&mut inner);
                }
            }
            // Open admits nothing, so no current-epoch outcome lands here.
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            debug!(breaker = %self.name, "ignoring failure from an earlier state");
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    self.trip(&mut inner);
                }
            }
            CircuitState::HalfOpen => self.trip(&mut inner),
            CircuitState::Open => {}
        }
    }

    fn trip(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.half_open_successes = 0;
        inner.epoch += 1;
        self.transitioned(CircuitState::Open);
        warn!(
            breaker = %self.name,
            consecutive_failures = inner.consecutive_failures,
            open_ms = self.config.open_duration.as_millis() as u64,
            "circuit opened"
        );
    }

    fn close(&self, inner: &mut BreakerState) {
        let was = inner.state;
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.half_open_successes = 0;
        inner.opened_at = None;
        inner.epoch += 1;
        if was != CircuitState::Closed {
            self.transitioned(CircuitState::Closed);
            info!(breaker = %self.name, "circuit closed");
        }
    }

    fn transitioned(&self, to: CircuitState) {
        metrics::counter!(telemetry::BREAKER_TRANSITIONS_TOTAL,
            "breaker" => self.name.clone(),
            "to" => to.as_str(),
        )
        .increment(1);
    }
}
