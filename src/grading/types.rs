//! Value types shared by the grade aggregator and the roster pipeline.

use clap::ValueEnum;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Grades or weights keyed by assignment/course identifier.
pub type ScoreMap = HashMap<String, RawValue>;

/// A grade or weight exactly as it arrived over the wire.
///
/// The grading API is loose about types: grades show up as numbers, as
/// numeric strings (`"85"`), as `null`, or missing altogether. Anything else
/// lands in [`RawValue::Other`] and is treated as malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
    Other(serde_json::Value),
}

impl RawValue {
    /// Coerces the value to a finite number.
    ///
    /// Strings are trimmed and may carry a trailing `%`. Returns `None` for
    /// missing, blank, unparsable, `NaN` and infinite values.
    pub fn as_finite(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => {
                let cleaned = s.trim().trim_end_matches('%').trim();
                if cleaned.is_empty() {
                    return None;
                }
                cleaned.parse::<f64>().ok()?
            }
            RawValue::Missing | RawValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// True for `null` and blank strings, as opposed to present-but-garbage.
    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Missing => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// How matched (grade, weight) pairs are folded into a final grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AggregationPolicy {
    /// `Σ grade·weight / Σ weight` over matched keys. Weights act as relative
    /// shares, so they need not sum to 100. A zero matched weight total
    /// yields [`FinalGrade::NotAvailable`].
    #[default]
    WeightedAverage,
    /// `Σ grade·(weight/100)` over matched keys, with no normalization.
    ///
    /// Known limitation: weights are assumed to already sum to ~100. When
    /// they don't (missing assignments, unmatched keys, bad data) the result
    /// is silently low. Check [`Aggregation::matched_weight`] to detect it.
    ///
    /// [`Aggregation::matched_weight`]: crate::grading::Aggregation::matched_weight
    PercentageScaled,
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationPolicy::WeightedAverage => f.write_str("weighted-average"),
            AggregationPolicy::PercentageScaled => f.write_str("percentage-scaled"),
        }
    }
}

/// Sentinel shown when no final grade can be determined.
pub const NOT_AVAILABLE: &str = "N/A";

/// A student's final grade, or the "not available" sentinel.
///
/// Displays (and serializes) as a one-decimal string such as `"85.0"`, or
/// as `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinalGrade {
    Score(f64),
    NotAvailable,
}

impl FinalGrade {
    pub fn value(&self) -> Option<f64> {
        match self {
            FinalGrade::Score(v) => Some(*v),
            FinalGrade::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FinalGrade::Score(_))
    }
}

/// Half-up rounding to one decimal: `floor(10x + 0.5) / 10`.
///
/// Works on the decimal value as written rather than its exact binary
/// expansion, so `80.35` rounds to `80.4` and `0.15` to `0.2`. Plain
/// `{:.1}` formatting would give `80.3` and `0.1`. Values too large to scale
/// are returned unchanged.
pub fn round_one_decimal(x: f64) -> f64 {
    let scaled = 10.0 * x;
    if !scaled.is_finite() {
        return x;
    }
    (scaled + 0.5).floor() / 10.0
}

impl fmt::Display for FinalGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalGrade::Score(v) => write!(f, "{:.1}", round_one_decimal(*v)),
            FinalGrade::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for FinalGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
