//! Features Module - Feature Layout & Scaling
//!
//! Detection runs on a single scalar feature per record.
//! Chuẩn hóa feature trước khi đưa vào model supervised.

pub mod scaler;

#[cfg(test)]
mod tests;

pub use scaler::StandardScaler;

/// Feature names in exact order they appear in the matrix
pub const FEATURE_LAYOUT: &[&str] = &[
    "data_size", // 0: payload bytes of the flow record
];

pub const FEATURE_COUNT: usize = FEATURE_LAYOUT.len();
