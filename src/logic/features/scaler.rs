//! Standard Scaler
//!
//! Per-column standardization `(x - mean) / std`, fitted once on the
//! training matrix and reused unchanged at scoring time.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, DetectorResult};

/// Fitted scaler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Array1<f64>,
    /// Population std, zero-variance columns stored as 1.0
    pub std: Array1<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    params: Option<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> DetectorResult<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(DetectorError::invalid("cannot fit scaler on an empty matrix"));
        }

        let n = x.nrows() as f64;
        let mean = x.sum_axis(Axis(0)) / n;
        let std = x
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(col, &m)| {
                let var = col.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > 0.0 && std.is_finite() { std } else { 1.0 }
            })
            .collect::<Array1<f64>>();

        log::debug!("Scaler fitted: mean={:?}, std={:?}", mean.to_vec(), std.to_vec());
        self.params = Some(ScalerParams { mean, std });
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> DetectorResult<Array2<f64>> {
        let params = self.params()?;
        if x.ncols() != params.mean.len() {
            return Err(DetectorError::invalid(format!(
                "scaler fitted on {} columns, got {}",
                params.mean.len(),
                x.ncols()
            )));
        }
        Ok((x - &params.mean) / &params.std)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> DetectorResult<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn params(&self) -> DetectorResult<&ScalerParams> {
        self.params
            .as_ref()
            .ok_or_else(|| DetectorError::unfitted("StandardScaler"))
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }
}
