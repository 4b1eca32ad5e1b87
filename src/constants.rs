//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change a detector default, only edit this file.

/// Default number of normal records generated per engine
pub const DEFAULT_RECORD_COUNT: usize = 1000;

/// Number of injected anomalous records (fixed by the generator contract)
pub const ANOMALY_RECORD_COUNT: usize = 50;

/// Default seed shared by generator, isolation forest and MLP init
pub const DEFAULT_SEED: u64 = 42;

/// Expected outlier fraction for the isolation forest
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Regression score above which a record is flagged by the MLP
pub const DEFAULT_MLP_THRESHOLD: f64 = 0.5;

/// Anomaly log file, relative to the process working directory
pub const DEFAULT_LOG_PATH: &str = "mock_anomaly_logs.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Traffic Anomaly Detector";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get normal record count from environment or use default
pub fn get_record_count() -> usize {
    std::env::var("DETECTOR_RECORD_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RECORD_COUNT)
}

/// Get random seed from environment or use default
pub fn get_seed() -> u64 {
    std::env::var("DETECTOR_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

/// Get isolation forest contamination from environment or use default
pub fn get_contamination() -> f64 {
    std::env::var("DETECTOR_CONTAMINATION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CONTAMINATION)
}

/// Get MLP decision threshold from environment or use default
pub fn get_mlp_threshold() -> f64 {
    std::env::var("DETECTOR_MLP_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MLP_THRESHOLD)
}

/// Get anomaly log path from environment or use default
pub fn get_log_path() -> String {
    std::env::var("DETECTOR_LOG_PATH")
        .unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string())
}
