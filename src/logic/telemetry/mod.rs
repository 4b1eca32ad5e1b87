//! Telemetry Module
//!
//! Persistent record of what the detector flagged.
//!
//! ## Structure
//! - `recorder.rs` - Append-only JSONL anomaly log
//!
//! ## Usage
//! ```ignore
//! use crate::logic::telemetry::AnomalyLogWriter;
//!
//! let log = AnomalyLogWriter::new("mock_anomaly_logs.json");
//! let written = log.append(dataset.records())?;
//! ```

pub mod recorder;

pub use recorder::{read_records, AnomalyLogWriter};
