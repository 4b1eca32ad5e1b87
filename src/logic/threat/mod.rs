//! Threat Module
//!
//! Gộp quyết định của các scorer thành một cờ anomaly duy nhất.
//!
//! ## Usage
//! ```ignore
//! use crate::logic::threat::{combine, combine_columns};
//!
//! assert!(combine(true, false));
//! let flags = combine_columns(&by_forest, &by_mlp)?;
//! ```

pub mod classifier;

pub use classifier::{combine, combine_columns};
