// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for scored-eviction.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding binary is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `scored_eviction_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for sizes
//!
//! # Labels
//! - `policy`: policy name
//! - `result`: hit, miss
//! - `error_type`: [`PolicyError::kind`](crate::PolicyError::kind)

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════════════════════
// CACHE - Accesses, admissions, evictions
// ═══════════════════════════════════════════════════════════════════════════

/// Record a cache access
pub fn record_access(policy: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(
        "scored_eviction_accesses_total",
        "policy" => policy.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record a miss whose object is larger than the whole cache
pub fn record_rejected(policy: &str) {
    counter!(
        "scored_eviction_rejected_total",
        "policy" => policy.to_string()
    )
    .increment(1);
}

/// Record eviction event
pub fn record_eviction(policy: &str, bytes: u64) {
    counter!(
        "scored_eviction_evictions_total",
        "policy" => policy.to_string()
    )
    .increment(1);
    counter!(
        "scored_eviction_evicted_bytes_total",
        "policy" => policy.to_string()
    )
    .increment(bytes);
}

/// Set current cache occupancy in size units
pub fn set_cache_bytes(policy: &str, bytes: u64) {
    gauge!(
        "scored_eviction_cache_bytes",
        "policy" => policy.to_string()
    )
    .set(bytes as f64);
}

/// Set number of keys the policy holds metadata for
pub fn set_tracked_keys(policy: &str, count: usize) {
    gauge!(
        "scored_eviction_tracked_keys",
        "policy" => policy.to_string()
    )
    .set(count as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TRACKING
// ═══════════════════════════════════════════════════════════════════════════

/// Record a policy contract violation
pub fn record_policy_error(policy: &str, error_type: &str) {
    counter!(
        "scored_eviction_policy_errors_total",
        "policy" => policy.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// SIMULATION
// ═══════════════════════════════════════════════════════════════════════════

/// Set the miss ratio of the last finished simulation
pub fn set_miss_ratio(policy: &str, miss_ratio: f64) {
    gauge!(
        "scored_eviction_miss_ratio",
        "policy" => policy.to_string()
    )
    .set(miss_ratio);
}

/// Record simulation wall-clock duration
pub fn record_simulation_duration(policy: &str, duration: Duration) {
    histogram!(
        "scored_eviction_simulation_seconds",
        "policy" => policy.to_string()
    )
    .record(duration.as_secs_f64());
}

/// A timing guard that records simulation duration on drop
pub struct LatencyTimer {
    policy: String,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_simulation_duration(&self.policy, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    /// Run `f` under a local recorder and return counter values by name.
    fn counters(f: impl FnOnce()) -> Vec<(String, Vec<(String, String)>, u64)> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, f);

        snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(key, _, _, value)| match value {
                DebugValue::Counter(n) => {
                    let labels = key
                        .key()
                        .labels()
                        .map(|l| (l.key().to_string(), l.value().to_string()))
                        .collect();
                    Some((key.key().name().to_string(), labels, n))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_record_access_labels() {
        let seen = counters(|| {
            record_access("lru", true);
            record_access("lru", true);
            record_access("lru", false);
        });

        let hits = seen
            .iter()
            .find(|(name, labels, _)| {
                name == "scored_eviction_accesses_total"
                    && labels.contains(&("result".to_string(), "hit".to_string()))
            })
            .unwrap();
        assert_eq!(hits.2, 2);
        assert!(hits.1.contains(&("policy".to_string(), "lru".to_string())));
    }

    #[test]
    fn test_record_eviction_counts_bytes() {
        let seen = counters(|| {
            record_eviction("fifo", 100);
            record_eviction("fifo", 28);
        });

        let bytes = seen
            .iter()
            .find(|(name, _, _)| name == "scored_eviction_evicted_bytes_total")
            .unwrap();
        assert_eq!(bytes.2, 128);
        let count = seen
            .iter()
            .find(|(name, _, _)| name == "scored_eviction_evictions_total")
            .unwrap();
        assert_eq!(count.2, 2);
    }

    #[test]
    fn test_gauges_without_recorder() {
        // No recorder installed: calls are no-ops and must not panic
        set_cache_bytes("lfu", 1024);
        set_tracked_keys("lfu", 12);
        set_miss_ratio("lfu", 0.42);
        record_rejected("lfu");
        record_policy_error("lfu", "empty_cache");
    }

    #[test]
    fn test_latency_timer() {
        {
            let timer = LatencyTimer::new("lru");
            std::thread::sleep(Duration::from_micros(10));
            assert!(timer.elapsed() >= Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
