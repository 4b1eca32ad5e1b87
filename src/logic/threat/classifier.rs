//! Decision Combiner
//!
//! CHỈ chứa logic gộp - không có state, không có policy.
//! Input: two per-record binary decisions
//! Output: one combined decision (logical OR)

use crate::error::{DetectorError, DetectorResult};
use crate::logic::dataset::Decisions;

/// A record is anomalous when either scorer flags it
pub fn combine(by_forest: bool, by_regressor: bool) -> bool {
    by_forest || by_regressor
}

/// Zip two decision columns into per-record `Decisions`
pub fn combine_columns(by_forest: &[bool], by_regressor: &[bool]) -> DetectorResult<Vec<Decisions>> {
    if by_forest.len() != by_regressor.len() {
        return Err(DetectorError::invalid(format!(
            "decision columns differ in length: {} vs {}",
            by_forest.len(),
            by_regressor.len()
        )));
    }

    Ok(by_forest
        .iter()
        .zip(by_regressor)
        .map(|(&f, &r)| Decisions::new(f, r))
        .collect())
}
