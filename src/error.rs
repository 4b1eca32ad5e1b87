//! Error handling

use std::path::PathBuf;
use thiserror::Error;

use crate::logic::dataset::TrafficRecord;

pub type DetectorResult<T> = Result<T, DetectorError>;

#[derive(Debug, Error)]
pub enum DetectorError {
    /// Scaler or model used before `fit`
    #[error("{component} used before fit")]
    UnfittedState { component: &'static str },

    /// Detection requested on an engine that has not been trained
    #[error("models are not trained; call train() before run_detection()")]
    ModelsNotTrained,

    /// Non-positive record count, malformed hyperparameters, shape mismatch
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Appending to the anomaly log failed. The detection result is still valid
    /// and travels with the error.
    #[error("failed to append to anomaly log {}: {source}", path.display())]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        anomalies: Vec<TrafficRecord>,
    },
}

impl DetectorError {
    pub fn unfitted(component: &'static str) -> Self {
        DetectorError::UnfittedState { component }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DetectorError::InvalidConfiguration(msg.into())
    }

    /// Recover the anomalous subset from a `LogWrite` failure.
    pub fn into_anomalies(self) -> Option<Vec<TrafficRecord>> {
        match self {
            DetectorError::LogWrite { anomalies, .. } => Some(anomalies),
            _ => None,
        }
    }
}
