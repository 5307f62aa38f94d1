//! Final-grade aggregation.
//!
//! Turns a student's per-assignment grades and the class's assignment weights
//! into one final grade. Everything here is pure and synchronous; degraded
//! input resolves to a skipped key or the `"N/A"` sentinel, never an error.

pub mod aggregate;
pub mod types;

pub use aggregate::{Aggregation, SkipReason, SkippedKey, aggregate, compute_final_grade};
pub use types::{AggregationPolicy, FinalGrade, NOT_AVAILABLE, RawValue, ScoreMap};
