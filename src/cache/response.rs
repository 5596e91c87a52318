//! Time-bounded response cache keyed by query text.
//!
//! # Expiry
//!
//! Each entry records when it was stored. A lookup returns the value only
//! while its age is strictly less than the configured TTL; a lookup that
//! finds an expired entry removes it (lazy eviction, there is no background
//! sweep). Lookups do not refresh the age of an entry.
//!
//! The expired-entry removal runs as a conditional per-key compute, so it
//! can never drop a fresher value written concurrently by another task.
//!
//! # Keying
//!
//! Entries are keyed by the raw query string only, not by the document the
//! query was asked against. Two documents receiving an identical query
//! share one cached answer. This mirrors the behaviour of the deployed
//! service; keying by `(document, query)` is a behaviour change that has
//! not been decided on.
//!
//! # Capacity
//!
//! Unbounded by default. [`CacheConfig::max_entries`] turns on moka's
//! size-bounded eviction for deployments where unbounded growth is a
//! concern.

use std::time::Duration;

use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;

/// Default time-to-live for cached responses: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Configuration for the response cache.
///
/// ```rust
/// # use docquery::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .ttl(Duration::from_secs(60))
///     .max_entries(10_000);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 300 seconds.
    pub ttl: Duration,
    /// Maximum number of cached entries. Default: unbounded.
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
    /// Create a new config with the default TTL and no capacity bound.
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

#[derive(Clone, Debug)]
struct CacheEntry {
    value: String,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// In-memory response cache shared by concurrent requests.
pub struct ResponseCache {
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = config.max_entries {
            builder = builder.max_capacity(max);
        }
        Self {
            entries: builder.build(),
            ttl: config.ttl,
        }
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a cached response.
    ///
    /// Returns `None` on a miss. An entry whose age has reached the TTL is
    /// treated as a miss and removed.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let ttl = self.ttl;
        let outcome = self
            .entries
            .entry_by_ref(key)
            .and_compute_with(|existing| {
                let op = match existing {
                    Some(entry) if entry.value().is_expired(now, ttl) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        match outcome {
            CompResult::Unchanged(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(entry.into_value().value)
            }
            CompResult::Removed(_) => {
                debug!(key, "evicted expired cache entry");
                metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(1);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
            _ => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a response, replacing any previous entry for `key`.
    pub async fn store(&self, key: impl Into<String>, value: impl Into<String>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };
        self.entries.insert(key.into(), entry).await;
    }

    /// Whether an entry for `key` is physically present, expired or not.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries currently held, including expired ones not yet
    /// encountered by a lookup.
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
