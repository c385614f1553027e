//! Per-adapter lookup statistics: hit counters per tier and remote fetch latency
//! percentiles (p50/p95/p99) over a window of recent fetches.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

const LATENCY_WINDOW: usize = 1024;

/// Tier that answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    Cache,
    Local,
    Remote,
}

/// Most recent remote fetch durations, oldest dropped first.
struct LatencyWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn record(&mut self, elapsed: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(elapsed);
    }

    /// Nearest-rank p50/p95/p99 over the window, in microseconds.
    fn summary(&self) -> LatencySummary {
        let mut sorted: Vec<u64> = self
            .samples
            .iter()
            .map(|d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
            .collect();
        sorted.sort_unstable();

        let rank = |p: usize| -> u64 {
            match sorted.len() {
                0 => 0,
                n => sorted[(p * n).div_ceil(100).saturating_sub(1).min(n - 1)],
            }
        };
        LatencySummary {
            p50_us: rank(50),
            p95_us: rank(95),
            p99_us: rank(99),
            count: sorted.len(),
        }
    }
}

pub struct LookupStats {
    cache_hits: AtomicU64,
    local_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    remote_failures: AtomicU64,
    cache_replacements: AtomicU64,
    remote_latency: Mutex<LatencyWindow>,
}

impl LookupStats {
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            local_hits: AtomicU64::new(0),
            remote_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            remote_failures: AtomicU64::new(0),
            cache_replacements: AtomicU64::new(0),
            remote_latency: Mutex::new(LatencyWindow::new(LATENCY_WINDOW)),
        }
    }

    pub fn record_hit(&self, source: LookupSource) {
        let counter = match source {
            LookupSource::Cache => &self.cache_hits,
            LookupSource::Local => &self.local_hits,
            LookupSource::Remote => &self.remote_hits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_failure(&self) {
        self.remote_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_replacement(&self) {
        self.cache_replacements.fetch_add(1, Ordering::Relaxed);
    }

    /// Wall time of one remote fetch, successful or not.
    pub fn record_remote_latency(&self, elapsed: Duration) {
        self.remote_latency.lock().record(elapsed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            local_hits: self.local_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            remote_failures: self.remote_failures.load(Ordering::Relaxed),
            cache_replacements: self.cache_replacements.load(Ordering::Relaxed),
            remote_latency: self.remote_latency.lock().summary(),
        }
    }
}

impl Default for LookupStats {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub local_hits: u64,
    pub remote_hits: u64,
    pub misses: u64,
    pub remote_failures: u64,
    pub cache_replacements: u64,
    pub remote_latency: LatencySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub count: usize,
}
