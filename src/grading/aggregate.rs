use crate::grading::types::{AggregationPolicy, FinalGrade, RawValue, ScoreMap};
use serde::Serialize;
use std::fmt;

/// Why a key present in both maps did not contribute to the final grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingGrade,
    InvalidGrade,
    MissingWeight,
    InvalidWeight,
    /// Both sides are finite but their product is not.
    Overflow,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MissingGrade => "missing grade",
            SkipReason::InvalidGrade => "grade is not a finite number",
            SkipReason::MissingWeight => "missing weight",
            SkipReason::InvalidWeight => "weight is not a finite number",
            SkipReason::Overflow => "grade times weight overflows",
        };
        f.write_str(s)
    }
}

/// A matched key that was left out of the computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedKey {
    pub key: String,
    pub reason: SkipReason,
    pub value: RawValue,
}

/// Result of [`aggregate`]: the final grade plus what went into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub policy: AggregationPolicy,
    pub final_grade: FinalGrade,
    /// Keys that contributed, in accumulation (sorted) order.
    pub matched: Vec<String>,
    /// Sum of the weights of the contributing keys.
    pub matched_weight: f64,
    pub skipped: Vec<SkippedKey>,
}

/// Computes a student's final grade from per-key grades and weights.
///
/// Pure: identical inputs always give identical output, whatever the
/// iteration order of the maps. See [`aggregate`] for the rules.
pub fn compute_final_grade(
    grades: &ScoreMap,
    weights: &ScoreMap,
    policy: AggregationPolicy,
) -> FinalGrade {
    aggregate(grades, weights, policy).final_grade
}

/// Folds matched (grade, weight) pairs into a final grade under `policy`.
///
/// Only keys present in both maps are considered; keys on one side only are
/// ignored. A matched key whose grade or weight does not coerce to a finite
/// number is skipped (not counted as zero) and reported in
/// [`Aggregation::skipped`]. With no contributing pair the result is
/// [`FinalGrade::NotAvailable`], as it is for
/// [`AggregationPolicy::WeightedAverage`] when the contributing weights sum
/// to zero. A pair whose product overflows is skipped as
/// [`SkipReason::Overflow`], and a non-finite total resolves to
/// [`FinalGrade::NotAvailable`], so the result is never `NaN` or infinite.
pub fn aggregate(grades: &ScoreMap, weights: &ScoreMap, policy: AggregationPolicy) -> Aggregation {
    // Sorted so float accumulation never depends on hash order.
    let mut keys: Vec<&String> = weights
        .keys()
        .filter(|key| grades.contains_key(*key))
        .collect();
    keys.sort();

    let mut matched = Vec::with_capacity(keys.len());
    let mut skipped = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for key in keys {
        let grade_raw = &grades[key];
        let weight_raw = &weights[key];

        let grade = match grade_raw.as_finite() {
            Some(g) => g,
            None => {
                skipped.push(skip(key, grade_raw, SkipReason::MissingGrade, SkipReason::InvalidGrade));
                continue;
            }
        };
        let weight = match weight_raw.as_finite() {
            Some(w) => w,
            None => {
                skipped.push(skip(key, weight_raw, SkipReason::MissingWeight, SkipReason::InvalidWeight));
                continue;
            }
        };

        let contribution = match policy {
            AggregationPolicy::WeightedAverage => grade * weight,
            AggregationPolicy::PercentageScaled => grade * (weight / 100.0),
        };
        if !contribution.is_finite() {
            skipped.push(SkippedKey {
                key: key.clone(),
                reason: SkipReason::Overflow,
                value: grade_raw.clone(),
            });
            continue;
        }
        weighted_sum += contribution;
        weight_sum += weight;
        matched.push(key.clone());
    }

    let score = if matched.is_empty() {
        None
    } else {
        match policy {
            AggregationPolicy::WeightedAverage if weight_sum == 0.0 => None,
            AggregationPolicy::WeightedAverage => Some(weighted_sum / weight_sum),
            AggregationPolicy::PercentageScaled => Some(weighted_sum),
        }
    };
    // Sums of finite contributions can still overflow or cancel to NaN.
    let final_grade = match score {
        Some(s) if s.is_finite() => FinalGrade::Score(s),
        _ => FinalGrade::NotAvailable,
    };

    Aggregation {
        policy,
        final_grade,
        matched,
        matched_weight: weight_sum,
        skipped,
    }
}

fn skip(key: &str, value: &RawValue, missing: SkipReason, invalid: SkipReason) -> SkippedKey {
    SkippedKey {
        key: key.to_string(),
        reason: if value.is_missing() { missing } else { invalid },
        value: value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AggregationPolicy::{PercentageScaled, WeightedAverage};

    fn map(pairs: &[(&str, RawValue)]) -> ScoreMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn num(v: f64) -> RawValue {
        RawValue::Number(v)
    }

    #[test]
    fn test_weighted_average_basic() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0))]);
        let weights = map(&[("a1", num(50.0)), ("a2", num(50.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, WeightedAverage).to_string(), "85.0");
    }

    #[test]
    fn test_weighted_average_ignores_unmatched_grade() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0)), ("a3", num(60.0))]);
        let weights = map(&[("a1", num(50.0)), ("a2", num(50.0))]);
        let agg = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(agg.final_grade.to_string(), "85.0");
        assert_eq!(agg.matched, vec!["a1", "a2"]);
        assert!(agg.skipped.is_empty());
    }

    #[test]
    fn test_weighted_average_ignores_unmatched_weight() {
        let grades = map(&[("a1", num(70.0))]);
        let weights = map(&[("a1", num(20.0)), ("a2", num(80.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, WeightedAverage).to_string(), "70.0");
    }

    #[test]
    fn test_weighted_average_normalizes_weights() {
        let grades = map(&[("a1", num(100.0)), ("a2", num(70.0))]);
        let weights = map(&[("a1", num(1.0)), ("a2", num(2.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, WeightedAverage).to_string(), "80.0");
    }

    #[test]
    fn test_percentage_scaled_basic() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0))]);
        let weights = map(&[("a1", num(50.0)), ("a2", num(50.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, PercentageScaled).to_string(), "85.0");
    }

    #[test]
    fn test_percentage_scaled_does_not_normalize() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0))]);
        let weights = map(&[("a1", num(25.0)), ("a2", num(25.0))]);
        let agg = aggregate(&grades, &weights, PercentageScaled);
        assert_eq!(agg.final_grade.to_string(), "42.5");
        assert_eq!(agg.matched_weight, 50.0);
    }

    #[test]
    fn test_percentage_scaled_zero_weights_is_zero_not_na() {
        let grades = map(&[("a1", num(80.0))]);
        let weights = map(&[("a1", num(0.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, PercentageScaled).to_string(), "0.0");
    }

    #[test]
    fn test_malformed_grade_is_skipped_not_zero() {
        let grades = map(&[("a1", RawValue::from("not-a-number")), ("a2", num(90.0))]);
        let weights = map(&[("a1", num(50.0)), ("a2", num(50.0))]);
        let agg = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(agg.final_grade.to_string(), "90.0");
        assert_eq!(agg.matched_weight, 50.0);
        assert_eq!(agg.skipped.len(), 1);
        assert_eq!(agg.skipped[0].key, "a1");
        assert_eq!(agg.skipped[0].reason, SkipReason::InvalidGrade);
    }

    #[test]
    fn test_null_grade_and_bad_weight_reasons() {
        let grades = map(&[("a1", RawValue::Missing), ("a2", num(90.0)), ("a3", num(70.0))]);
        let weights = map(&[
            ("a1", num(30.0)),
            ("a2", RawValue::from("heavy")),
            ("a3", RawValue::Missing),
        ]);
        let agg = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(agg.final_grade, FinalGrade::NotAvailable);
        let reasons: Vec<_> = agg.skipped.iter().map(|s| (s.key.as_str(), s.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("a1", SkipReason::MissingGrade),
                ("a2", SkipReason::InvalidWeight),
                ("a3", SkipReason::MissingWeight),
            ]
        );
    }

    #[test]
    fn test_numeric_strings_are_parsed() {
        let grades = map(&[("a1", RawValue::from("80")), ("a2", RawValue::from("90.0"))]);
        let weights = map(&[("a1", RawValue::from("50")), ("a2", num(50.0))]);
        assert_eq!(compute_final_grade(&grades, &weights, WeightedAverage).to_string(), "85.0");
    }

    #[test]
    fn test_empty_inputs_are_na() {
        let empty = ScoreMap::new();
        assert_eq!(compute_final_grade(&empty, &empty, WeightedAverage).to_string(), "N/A");
        assert_eq!(compute_final_grade(&empty, &empty, PercentageScaled).to_string(), "N/A");
    }

    #[test]
    fn test_disjoint_keys_are_na() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0))]);
        let weights = map(&[("b1", num(50.0)), ("b2", num(50.0))]);
        for policy in [WeightedAverage, PercentageScaled] {
            let agg = aggregate(&grades, &weights, policy);
            assert_eq!(agg.final_grade, FinalGrade::NotAvailable);
            assert!(agg.matched.is_empty());
            assert!(agg.skipped.is_empty());
        }
    }

    #[test]
    fn test_zero_total_weight_is_na() {
        let grades = map(&[("a1", num(80.0)), ("a2", num(90.0))]);
        let zeros = map(&[("a1", num(0.0)), ("a2", num(0.0))]);
        assert_eq!(compute_final_grade(&grades, &zeros, WeightedAverage), FinalGrade::NotAvailable);

        let cancelling = map(&[("a1", num(50.0)), ("a2", num(-50.0))]);
        assert_eq!(
            compute_final_grade(&grades, &cancelling, WeightedAverage),
            FinalGrade::NotAvailable
        );
    }

    #[test]
    fn test_idempotent() {
        let grades = map(&[("a1", num(81.3)), ("a2", RawValue::from("77.7")), ("x", num(1.0))]);
        let weights = map(&[("a1", num(33.3)), ("a2", num(66.7))]);
        let first = aggregate(&grades, &weights, WeightedAverage);
        let second = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(first, second);
    }

    #[test]
    fn test_order_independent() {
        let pairs: Vec<(String, f64, f64)> = (0..40)
            .map(|i| (format!("a{i}"), 50.0 + (i as f64) * 1.37, 0.1 + (i as f64) * 0.73))
            .collect();

        let build = |order: &[usize]| {
            let mut grades = ScoreMap::new();
            let mut weights = ScoreMap::new();
            for &i in order {
                let (k, g, w) = &pairs[i];
                grades.insert(k.clone(), num(*g));
                weights.insert(k.clone(), num(*w));
            }
            (grades, weights)
        };

        let forward: Vec<usize> = (0..pairs.len()).collect();
        let reverse: Vec<usize> = forward.iter().rev().copied().collect();
        let interleaved: Vec<usize> = forward
            .iter()
            .filter(|i| *i % 2 == 0)
            .chain(forward.iter().filter(|i| *i % 2 == 1))
            .copied()
            .collect();

        for policy in [WeightedAverage, PercentageScaled] {
            let (g, w) = build(&forward);
            let expected = compute_final_grade(&g, &w, policy);
            for order in [&reverse, &interleaved] {
                let (g, w) = build(order);
                assert_eq!(compute_final_grade(&g, &w, policy), expected);
            }
        }
    }

    #[test]
    fn test_overflowing_products_are_skipped() {
        let grades = map(&[("a", num(1e300)), ("b", num(-1e300))]);
        let weights = map(&[("a", num(1e10)), ("b", num(1e10))]);
        let agg = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(agg.final_grade, FinalGrade::NotAvailable);
        assert!(agg.matched.is_empty());
        let reasons: Vec<_> = agg.skipped.iter().map(|s| (s.key.as_str(), s.reason)).collect();
        assert_eq!(reasons, vec![("a", SkipReason::Overflow), ("b", SkipReason::Overflow)]);

        let grades = map(&[("a", num(1e200))]);
        let weights = map(&[("a", num(1e200))]);
        assert_eq!(
            compute_final_grade(&grades, &weights, PercentageScaled),
            FinalGrade::NotAvailable
        );
    }

    #[test]
    fn test_overflow_skip_keeps_other_pairs() {
        let grades = map(&[("a", num(1e308)), ("b", num(70.0))]);
        let weights = map(&[("a", num(50.0)), ("b", num(50.0))]);
        let agg = aggregate(&grades, &weights, WeightedAverage);
        assert_eq!(agg.final_grade.to_string(), "70.0");
        assert_eq!(agg.matched, vec!["b"]);
        assert_eq!(agg.skipped[0].reason, SkipReason::Overflow);
    }

    #[test]
    fn test_overflowing_total_is_na() {
        // Each product is finite; their sum is not.
        let grades = map(&[("a", num(1e308)), ("b", num(1e308))]);
        for (policy, w) in [(WeightedAverage, 1.0), (PercentageScaled, 100.0)] {
            let weights = map(&[("a", num(w)), ("b", num(w))]);
            let agg = aggregate(&grades, &weights, policy);
            assert_eq!(agg.matched, vec!["a", "b"]);
            assert_eq!(agg.final_grade, FinalGrade::NotAvailable);
            assert_eq!(agg.final_grade.to_string(), "N/A");
        }
    }
}
