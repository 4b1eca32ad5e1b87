//! Traffic Anomaly Core
//!
//! Flags anomalous network-traffic records by OR-combining an isolation
//! forest and an MLP regressor, and appends what it flags to a JSONL log.

pub mod constants;
pub mod error;
pub mod logic;

pub use error::{DetectorError, DetectorResult};
pub use logic::config::DetectorConfig;
pub use logic::dataset::{Dataset, Decisions, TrafficRecord};
pub use logic::engine::{AnomalyDetector, EngineState, EngineStatus};
pub use logic::report::{render_report, DetectionSummary};
