//! Batching JSON Lines sink.
//!
//! One append-mode `.jsonl` file per logical table. Each line is a complete
//! JSON object, so an interrupted write corrupts at most one line and the
//! files stay readable mid-session.

use crate::error::PersistResult;
use crate::record::TelemetryRecord;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Destination for telemetry records.
///
/// `append` buffers; `flush` makes everything appended so far durable
/// (best-effort). Implementations must be safe to call after a failure.
pub trait TelemetrySink: Send {
    fn append(&mut self, record: &TelemetryRecord) -> PersistResult<()>;
    fn flush(&mut self) -> PersistResult<()>;
}

/// JSON Lines sink with size-threshold batching.
pub struct JsonLinesSink {
    base_dir: PathBuf,
    batch_size: usize,
    /// Serialized lines waiting to be written, per table.
    pending: Vec<(&'static str, String)>,
    writers: HashMap<&'static str, BufWriter<File>>,
    records_written: u64,
}

impl JsonLinesSink {
    /// Create a sink rooted at `base_dir` (created if missing), flushing
    /// every `batch_size` records.
    pub fn new(base_dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        let base_dir = base_dir.into();
        if let Err(e) = std::fs::create_dir_all(&base_dir) {
            warn!(?e, dir = %base_dir.display(), "failed to create data directory");
        }

        Self {
            base_dir,
            batch_size: batch_size.max(1),
            pending: Vec::new(),
            writers: HashMap::new(),
            records_written: 0,
        }
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    fn writer_for(&mut self, table: &'static str) -> PersistResult<&mut BufWriter<File>> {
        if !self.writers.contains_key(table) {
            let path = self.base_dir.join(format!("{table}.jsonl"));
            info!(path = %path.display(), "opening table file (append mode)");
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            self.writers.insert(table, BufWriter::new(file));
        }
        Ok(self.writers.get_mut(table).expect("writer just inserted"))
    }
}

impl TelemetrySink for JsonLinesSink {
    fn append(&mut self, record: &TelemetryRecord) -> PersistResult<()> {
        let line = serde_json::to_string(record)?;
        self.pending.push((record.table_name(), line));

        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> PersistResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(&mut self.pending);
        let count = batch.len();
        for (table, line) in batch {
            let writer = self.writer_for(table)?;
            writeln!(writer, "{line}")?;
        }
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }

        self.records_written += count as u64;
        debug!(records = count, "flushed telemetry batch");
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(?e, "failed to flush sink on drop");
        }
    }
}
