//! Traffic Anomaly Detector - Headless Runner
//!
//! Trains the engine from environment configuration, runs one detection
//! pass and prints the threat report.

use std::process::ExitCode;

use traffic_anomaly_core::constants::{APP_NAME, APP_VERSION};
use traffic_anomaly_core::{render_report, AnomalyDetector, DetectorConfig, DetectorError};

fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    let config = DetectorConfig::from_env();
    let mut detector = match AnomalyDetector::new(config) {
        Ok(detector) => detector,
        Err(e) => {
            log::error!("Engine setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (anomalies, code) = match detector.run_detection() {
        Ok(anomalies) => (anomalies, ExitCode::SUCCESS),
        Err(e @ DetectorError::LogWrite { .. }) => {
            // The detection result is still valid, show it anyway
            eprintln!("Error: {}", e);
            (e.into_anomalies().unwrap_or_default(), ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("{}", render_report(&anomalies));
    log::info!("{}", detector.summary());
    code
}
