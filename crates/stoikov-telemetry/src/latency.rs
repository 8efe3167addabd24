//! Latency instrumentation.
//!
//! `LatencyRegistry` collects nanosecond samples into named buckets. Each
//! bucket keeps count/total/min/max plus a fixed-capacity ring of the most
//! recent samples from which percentiles are computed by sorting a copy.
//!
//! The registry is created by the binary and handed down explicitly; the
//! enabled flag is checked before taking any lock so the disabled path is a
//! single predictable branch.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Samples retained per operation for percentile estimation.
const RING_CAPACITY: usize = 1000;

/// Fixed-capacity ring of recent samples; overwrites the oldest entry.
#[derive(Debug, Clone)]
struct SampleRing {
    samples: Vec<u64>,
    head: usize,
}

impl SampleRing {
    fn new() -> Self {
        Self {
            samples: Vec::with_capacity(RING_CAPACITY),
            head: 0,
        }
    }

    fn push(&mut self, value: u64) {
        if self.samples.len() < RING_CAPACITY {
            self.samples.push(value);
        } else {
            self.samples[self.head] = value;
            self.head = (self.head + 1) % RING_CAPACITY;
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sorted(&self) -> Vec<u64> {
        let mut copy = self.samples.clone();
        copy.sort_unstable();
        copy
    }
}

/// Statistics for one named operation.
#[derive(Debug, Clone)]
struct OperationStats {
    count: u64,
    total_ns: u64,
    min_ns: u64,
    max_ns: u64,
    ring: SampleRing,
}

impl OperationStats {
    fn new() -> Self {
        Self {
            count: 0,
            total_ns: 0,
            min_ns: u64::MAX,
            max_ns: 0,
            ring: SampleRing::new(),
        }
    }

    fn add_sample(&mut self, latency_ns: u64) {
        self.count += 1;
        self.total_ns += latency_ns;
        self.min_ns = self.min_ns.min(latency_ns);
        self.max_ns = self.max_ns.max(latency_ns);
        self.ring.push(latency_ns);
    }

    fn percentile_ns(&self, p: f64) -> u64 {
        let sorted = self.ring.sorted();
        if sorted.is_empty() {
            return 0;
        }
        let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

/// Point-in-time view of one operation's stats, in microseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySnapshot {
    pub count: u64,
    pub avg_us: f64,
    pub min_us: f64,
    pub max_us: f64,
    pub p50_us: f64,
    pub p90_us: f64,
    pub p99_us: f64,
}

/// Registry of latency buckets keyed by operation name.
pub struct LatencyRegistry {
    enabled: AtomicBool,
    ops: Mutex<HashMap<&'static str, OperationStats>>,
}

impl LatencyRegistry {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            ops: Mutex::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Record one sample. No-op while disabled.
    pub fn record(&self, operation: &'static str, latency_ns: u64) {
        if !self.is_enabled() {
            return;
        }
        let mut ops = self.ops.lock();
        ops.entry(operation)
            .or_insert_with(OperationStats::new)
            .add_sample(latency_ns);
    }

    /// Start a scoped timer that records into `operation` on drop.
    pub fn scoped(&self, operation: &'static str) -> ScopedTimer<'_> {
        ScopedTimer {
            registry: self,
            operation,
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Snapshot one operation's stats, if it has any samples.
    pub fn snapshot(&self, operation: &str) -> Option<LatencySnapshot> {
        let ops = self.ops.lock();
        let stats = ops.get(operation)?;
        if stats.count == 0 {
            return None;
        }
        Some(LatencySnapshot {
            count: stats.count,
            avg_us: stats.total_ns as f64 / stats.count as f64 / 1000.0,
            min_us: stats.min_ns as f64 / 1000.0,
            max_us: stats.max_ns as f64 / 1000.0,
            p50_us: stats.percentile_ns(0.50) as f64 / 1000.0,
            p90_us: stats.percentile_ns(0.90) as f64 / 1000.0,
            p99_us: stats.percentile_ns(0.99) as f64 / 1000.0,
        })
    }

    /// Drop all collected stats. The enabled flag is untouched.
    pub fn reset(&self) {
        self.ops.lock().clear();
    }

    /// Formatted report over every bucket, sorted by name.
    pub fn report(&self) -> String {
        let ops = self.ops.lock();
        let mut names: Vec<&&str> = ops.keys().collect();
        names.sort();

        let mut out = String::from("=== Latency Report ===\n");
        for name in names {
            let stats = &ops[*name];
            let avg_us = if stats.count > 0 {
                stats.total_ns as f64 / stats.count as f64 / 1000.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{name}: count={} avg={:.2}us min={:.2}us max={:.2}us p50={:.2}us p99={:.2}us",
                stats.count,
                avg_us,
                stats.min_ns as f64 / 1000.0,
                stats.max_ns as f64 / 1000.0,
                stats.percentile_ns(0.50) as f64 / 1000.0,
                stats.percentile_ns(0.99) as f64 / 1000.0,
            );
        }
        out
    }
}

/// Timer that records elapsed nanoseconds into its bucket when dropped (or
/// stopped explicitly).
pub struct ScopedTimer<'a> {
    registry: &'a LatencyRegistry,
    operation: &'static str,
    start: Instant,
    stopped: bool,
}

impl ScopedTimer<'_> {
    /// Record now instead of at drop.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.registry
                .record(self.operation, self.start.elapsed().as_nanos() as u64);
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        self.stop();
    }
}
