//! Time-bounded key/value store.
//!
//! Backed by moka's concurrent cache with a fixed time-to-live. Expiry is
//! enforced on read: an entry whose deadline has passed is never returned and
//! is evicted lazily by moka's maintenance. Size is unbounded unless
//! [`CacheConfig::max_entries`] is set, in which case moka evicts by
//! recency/frequency once the bound is reached.
//!
//! The cache gives no atomicity across a `get` followed by a `set`. Two
//! concurrent identical requests can both miss and both reach the upstream;
//! the second `set` simply overwrites the first.

use std::time::Duration;

use moka::sync::Cache;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Configuration for a [`TtlCache`].
///
/// ```rust
/// # use askme::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .ttl(Duration::from_secs(10))
///     .max_entries(1_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 5 seconds.
    pub ttl: Duration,
    /// Optional capacity bound. Default: unbounded.
    pub max_entries: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bound the number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = Some(n);
        self
    }
}

/// Thread-safe string-keyed cache with a fixed TTL.
///
/// Values are cloned out on `get`; wrap large values in `Arc` to share them.
pub struct TtlCache<V> {
    entries: Cache<String, V>,
    ttl: Duration,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(&CacheConfig::new().ttl(ttl))
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder().time_to_live(config.ttl);
        if let Some(max) = config.max_entries {
            builder = builder.max_capacity(max);
        }
        Self {
            entries: builder.build(),
            ttl: config.ttl,
        }
    }

    /// Look up a live entry.
    ///
    /// Returns `None` on a miss or once the entry's TTL has elapsed.
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key)
    }

    /// Insert (or overwrite) a value; its TTL restarts from now.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Configured entry lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Approximate number of entries, after flushing pending maintenance.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
