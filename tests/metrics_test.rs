//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use docquery::telemetry;
use docquery::{GenerationProvider, ResilientInvoker, ResponseCache, RetryPolicy, UpstreamError};

// ============================================================================
// Mock providers
// ============================================================================

/// Fails with a connection error `failures` times, then succeeds.
struct FlakyProvider {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait]
impl GenerationProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n < self.failures {
            Err(UpstreamError::Connect("refused".into()))
        } else {
            Ok("ok".into())
        }
    }
}

struct RateLimitedProvider;

#[async_trait]
impl GenerationProvider for RateLimitedProvider {
    fn name(&self) -> &str {
        "limited"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, UpstreamError> {
        Err(UpstreamError::Status {
            status: 429,
            message: "quota".into(),
        })
    }
}

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values matching a name and a label pair.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::new()
        .max_attempts(3)
        .base_delay(Duration::from_millis(1))
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` keeps the sync `with_local_recorder` closure on the
/// current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn retries_and_success_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let invoker = ResilientInvoker::new(
                    Arc::new(FlakyProvider {
                        failures: 2,
                        calls: AtomicU32::new(0),
                    }),
                    fast_policy(),
                );
                invoker.invoke("doc", "q").await
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 2);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::INVOCATIONS_TOTAL, "status", "ok"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::RETRIES_TOTAL, "provider", "flaky"),
        2
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn terminal_failure_is_counted_by_status() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let invoker = ResilientInvoker::new(Arc::new(RateLimitedProvider), fast_policy());
                invoker.invoke("doc", "q").await
            })
        })
    });
    assert!(result.is_err());

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::RETRIES_TOTAL), 0);
    assert_eq!(
        counter_with_label(&snapshot, telemetry::INVOCATIONS_TOTAL, "status", "429"),
        1
    );
}

/// Paused clock needs a current-thread runtime, built inside the recorder scope.
#[test]
fn cache_hits_misses_and_expiries_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .unwrap();
        rt.block_on(async {
            let cache = ResponseCache::default();
            cache.lookup("q").await; // miss
            cache.store("q", "a").await;
            cache.lookup("q").await; // hit
            tokio::time::advance(Duration::from_secs(300)).await;
            cache.lookup("q").await; // expired miss
        });
    });

    let snapshot = snapshotter.snapshot().into_vec();
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_EXPIRED_TOTAL), 1);
}

#[tokio::test]
async fn metrics_emitted_without_panic() {
    // Without a metrics recorder installed, all metric calls should be no-ops
    let cache = ResponseCache::default();
    cache.lookup("q").await;
    cache.store("q", "a").await;
    assert!(cache.lookup("q").await.is_some());
}
