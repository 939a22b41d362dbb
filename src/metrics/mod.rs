//! Metrics collection module
//!
//! Tracks backend response times, error rates and how many searches were
//! dispatched or rejected.

use crate::results::Timing;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Number of response times kept per backend
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct BackendCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    response_times: VecDeque<u64>,
}

impl BackendCounters {
    fn avg_response_time(&self) -> Option<u64> {
        if self.response_times.is_empty() {
            None
        } else {
            Some(self.response_times.iter().sum::<u64>() / self.response_times.len() as u64)
        }
    }

    fn reliability(&self) -> f64 {
        if self.searches == 0 {
            100.0
        } else {
            (self.successes as f64 / self.searches as f64) * 100.0
        }
    }
}

/// In-process metrics shared by the aggregator and the web layer
#[derive(Debug, Default)]
pub struct Metrics {
    /// Aggregations that reached the backends
    total_searches: AtomicU64,
    /// Requests refused before dispatch
    rejected_searches: AtomicU64,
    backends: RwLock<HashMap<String, BackendCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a dispatched aggregation
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request the query gate refused
    pub fn inc_rejected(&self) {
        self.rejected_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one finished backend call
    pub fn record(&self, timing: &Timing) {
        let mut backends = self.write();
        let counters = backends.entry(timing.backend.clone()).or_default();

        counters.searches += 1;
        if timing.success {
            counters.successes += 1;
        } else {
            counters.errors += 1;
        }

        if counters.response_times.len() >= RESPONSE_WINDOW {
            counters.response_times.pop_front();
        }
        counters.response_times.push_back(timing.time_ms);
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    pub fn rejected_searches(&self) -> u64 {
        self.rejected_searches.load(Ordering::Relaxed)
    }

    /// Average of the recent response times for a backend
    pub fn avg_response_time(&self, backend: &str) -> Option<u64> {
        self.read().get(backend)?.avg_response_time()
    }

    /// Percentage of successful calls; 100 when nothing was recorded
    pub fn reliability(&self, backend: &str) -> f64 {
        self.read()
            .get(backend)
            .map(|c| c.reliability())
            .unwrap_or(100.0)
    }

    /// Point-in-time view of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let backends = self.read();
        let stats = backends
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    BackendStats {
                        searches: c.searches,
                        errors: c.errors,
                        avg_response_time_ms: c.avg_response_time(),
                        reliability: c.reliability(),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            total_searches: self.total_searches(),
            rejected_searches: self.rejected_searches(),
            backends: stats,
        }
    }

    // Counters stay consistent across a poisoned lock
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Statistics for a single backend
#[derive(Debug, Clone, Serialize)]
pub struct BackendStats {
    pub searches: u64,
    pub errors: u64,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

/// Serializable metrics view served by `/stats`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub rejected_searches: u64,
    pub backends: BTreeMap<String, BackendStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(backend: &str, time_ms: u64, success: bool) -> Timing {
        Timing {
            backend: backend.to_string(),
            time_ms,
            success,
        }
    }

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record(&timing("summon", 100, true));
        metrics.record(&timing("summon", 300, false));

        assert_eq!(metrics.total_searches(), 1);
        assert_eq!(metrics.avg_response_time("summon"), Some(200));
        assert_eq!(metrics.reliability("summon"), 50.0);
        assert_eq!(metrics.reliability("aquabrowser"), 100.0);
    }

    #[test]
    fn test_response_window() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record(&timing("aquabrowser", 10, true));
        }
        metrics.record(&timing("aquabrowser", 1010, true));

        assert_eq!(metrics.avg_response_time("aquabrowser"), Some(20));
    }

    #[test]
    fn test_snapshot() {
        let metrics = Metrics::new();
        metrics.inc_rejected();
        metrics.record(&timing("aquabrowser", 40, false));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rejected_searches, 1);
        assert_eq!(snapshot.backends["aquabrowser"].errors, 1);
        assert_eq!(snapshot.backends["aquabrowser"].reliability, 0.0);
    }
}
