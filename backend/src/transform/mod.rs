//! Transformation module.
//!
//! - Coerce: cell-level text/amount/date coercions
//! - Normalizer: drop, rename and type the source columns
//! - Aggregate: chronological sort, total and period label
//! - Pipeline: end-to-end processing of an upload

pub mod aggregate;
pub mod coerce;
pub mod normalizer;
pub mod pipeline;

pub use aggregate::aggregate;
pub use normalizer::{normalize, Normalized, DROPPED_COLUMNS, RENAMED_COLUMNS};
pub use pipeline::*;
