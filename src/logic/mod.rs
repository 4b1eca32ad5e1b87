//! Logic Module - Detection Core
//!
//! Chứa các thành phần xử lý: Dataset, Features, Model, Threat, Telemetry.
//!
//! ## Architecture
//! - `dataset/` - Synthetic traffic generation and the record table
//! - `features/` - Feature layout and standardization
//! - `model/` - Isolation forest, MLP regressor, scorer trait
//! - `threat/` - Decision combiner
//! - `telemetry/` - Append-only anomaly log
//! - `engine.rs` - Train-once, score-many detection engine

pub mod config;
pub mod dataset;
pub mod engine;
pub mod features;
pub mod model;
pub mod report;
pub mod telemetry;
pub mod threat;
