//! Anomaly Log Recorder
//!
//! Append-only JSONL writer for flagged traffic records.
//! The file is opened lazily (create + append) on the first write and the
//! handle is kept for the writer's lifetime. Nothing is ever truncated.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logic::dataset::TrafficRecord;

// ============================================================================
// RECORDER
// ============================================================================

pub struct AnomalyLogWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
    lines_written: AtomicU64,
}

impl AnomalyLogWriter {
    /// No I/O happens until the first `append`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
            lines_written: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines appended by this writer since construction
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::SeqCst)
    }

    /// Append every anomalous record as one JSON line, then flush.
    ///
    /// Records with `anomaly == 0` are skipped. Returns the number of lines written.
    pub fn append(&self, records: &[TrafficRecord]) -> std::io::Result<usize> {
        let mut guard = self.file.lock();
        let file = match guard.take() {
            Some(file) => file,
            None => Self::open(&self.path)?,
        };
        let file = guard.insert(file);

        // Whole pass goes out in one write, so no line is split from its newline
        let mut buf = String::new();
        let mut count = 0;
        for record in records.iter().filter(|r| r.is_anomaly()) {
            buf.push_str(&record.to_jsonl()?);
            buf.push('\n');
            count += 1;
        }

        file.write_all(buf.as_bytes())?;
        file.flush()?;

        self.lines_written.fetch_add(count as u64, Ordering::SeqCst);
        log::debug!("Appended {} anomalies to {:?}", count, self.path);
        Ok(count)
    }

    fn open(path: &Path) -> std::io::Result<File> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("Opened anomaly log: {:?}", path);
        Ok(file)
    }
}

// ============================================================================
// QUERY API (for reading logs)
// ============================================================================

/// Read back every record in a log file; blank lines are skipped
pub fn read_records(path: &Path) -> std::io::Result<Vec<TrafficRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            records.push(serde_json::from_str(&line)?);
        }
    }

    Ok(records)
}

// ============================================================================
// TESTS
// ============================================================================
