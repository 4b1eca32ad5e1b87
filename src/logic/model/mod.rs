//! Model Module - Anomaly Scorers
//!
//! Tách logic model khỏi dataset và engine.
//! Dễ dàng swap model, thêm scorer mới sau `BinaryScorer`.

pub mod adam;
pub mod isolation;
pub mod lbfgs;
pub mod mlp;
pub mod scorer;
pub mod threshold;

// Re-export common types
pub use isolation::{IsolationConfig, IsolationForest};
pub use mlp::{MlpConfig, MlpRegressor, Solver};
pub use scorer::{BinaryScorer, IsolationScorer, RegressionScorer, Scaled};
pub use threshold::ThresholdConfig;
