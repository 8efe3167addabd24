//! Bounded telemetry queue and background sink task.
//!
//! The pipeline pushes records through a cloneable `TelemetryHandle`; a
//! spawned task drains them into the sink. The queue is bounded and evicts
//! the OLDEST record on overflow, so the hot path never blocks and memory
//! stays fixed. Sink failures are counted and logged, never propagated.

use crate::record::TelemetryRecord;
use crate::sink::TelemetrySink;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Counters for the sink task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Records evicted because the queue was full.
    pub dropped: u64,
    /// Failed sink operations.
    pub failures: u64,
    /// Records handed to the sink successfully.
    pub persisted: u64,
}

struct Shared {
    queue: Mutex<VecDeque<TelemetryRecord>>,
    capacity: usize,
    notify: Notify,
    closed: AtomicBool,
    dropped: AtomicU64,
    failures: AtomicU64,
    persisted: AtomicU64,
}

/// Cloneable producer handle for the telemetry queue.
#[derive(Clone)]
pub struct TelemetryHandle {
    shared: Arc<Shared>,
}

impl TelemetryHandle {
    /// Enqueue a record without blocking. If the queue is at capacity the
    /// oldest queued record is evicted first (best-effort telemetry).
    pub fn push(&self, record: TelemetryRecord) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.capacity {
                queue.pop_front();
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
            queue.push_back(record);
        }
        self.shared.notify.notify_one();
    }

    /// Signal the sink task to drain remaining records and exit.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.notify.notify_one();
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            dropped: self.shared.dropped.load(Ordering::Relaxed),
            failures: self.shared.failures.load(Ordering::Relaxed),
            persisted: self.shared.persisted.load(Ordering::Relaxed),
        }
    }
}

/// Spawn the background sink task.
///
/// Returns the producer handle and the task's `JoinHandle`; await the latter
/// after `close()` to be sure the final flush happened.
pub fn spawn_sink<S>(mut sink: S, capacity: usize) -> (TelemetryHandle, JoinHandle<()>)
where
    S: TelemetrySink + 'static,
{
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::with_capacity(capacity)),
        capacity: capacity.max(1),
        notify: Notify::new(),
        closed: AtomicBool::new(false),
        dropped: AtomicU64::new(0),
        failures: AtomicU64::new(0),
        persisted: AtomicU64::new(0),
    });

    let handle = TelemetryHandle {
        shared: shared.clone(),
    };

    let join = tokio::spawn(async move {
        debug!("telemetry sink task started");
        loop {
            let batch: Vec<TelemetryRecord> = {
                let mut queue = shared.queue.lock();
                queue.drain(..).collect()
            };

            for record in &batch {
                match sink.append(record) {
                    Ok(()) => {
                        shared.persisted.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        shared.failures.fetch_add(1, Ordering::Relaxed);
                        warn!(?e, "telemetry write failed (best-effort, continuing)");
                    }
                }
            }

            if shared.closed.load(Ordering::SeqCst) && shared.queue.lock().is_empty() {
                break;
            }
            shared.notify.notified().await;
        }

        if let Err(e) = sink.flush() {
            shared.failures.fetch_add(1, Ordering::Relaxed);
            warn!(?e, "final telemetry flush failed");
        }
        debug!("telemetry sink task terminated");
    });

    (handle, join)
}
