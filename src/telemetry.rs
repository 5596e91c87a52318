//! Telemetry metric name constants.
//!
//! Centralised metric names for docquery operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `docquery_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `provider`: generation provider name (e.g. "gemini")
//! - `status`: invocation outcome: "ok" or the classified status code

/// Total invocations of the resilient invoker.
///
/// Labels: `provider`, `status` ("ok" | "429" | "500" | "502" | "504").
pub const INVOCATIONS_TOTAL: &str = "docquery_invocations_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "docquery_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "docquery_cache_hits_total";

/// Total response cache misses, including lookups that found an expired entry.
pub const CACHE_MISSES_TOTAL: &str = "docquery_cache_misses_total";

/// Total expired entries removed by lookups.
pub const CACHE_EXPIRED_TOTAL: &str = "docquery_cache_expired_total";
