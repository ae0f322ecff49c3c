// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Score formulas for ranking eviction candidates.
//!
//! Every formula reads the same feature vector from a [`KeyMetadata`] record
//! at logical time `now`:
//!
//! ```text
//! frequency      access counter
//! 1/frequency    inverse access counter
//! recency        last_access timestamp (larger = more recent)
//! age            now - last_access
//! decay          decay score
//! reinforcement  reinforcement score
//! size           object size
//! ```
//!
//! Scores are plain `f64` with no normalisation. A formula can produce
//! `inf`/`NaN` (zero denominator, `0^-w`); the policy rejects those rather
//! than ranking them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::metadata::KeyMetadata;

/// One weight per feature, plus a constant term.
///
/// Missing fields deserialize as `0.0`, so a JSON description only names the
/// features it uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub bias: f64,
    pub frequency: f64,
    pub inverse_frequency: f64,
    pub recency: f64,
    pub age: f64,
    pub decay: f64,
    pub reinforcement: f64,
    pub size: f64,
}

impl Weights {
    /// Feature values paired with their weights (bias excluded).
    fn terms(&self, record: &KeyMetadata, now: u64) -> [(f64, f64); 7] {
        [
            (self.frequency, record.frequency),
            (self.inverse_frequency, record.frequency.recip()),
            (self.recency, record.last_access as f64),
            (self.age, record.age(now) as f64),
            (self.decay, record.decay),
            (self.reinforcement, record.reinforcement),
            (self.size, record.size as f64),
        ]
    }

    /// `bias + Σ w·x` over non-zero weights, so an unused `1/frequency`
    /// cannot turn into `0 · inf`.
    pub fn weighted_sum(&self, record: &KeyMetadata, now: u64) -> f64 {
        self.terms(record, now)
            .iter()
            .filter(|(w, _)| *w != 0.0)
            .fold(self.bias, |acc, (w, x)| acc + w * x)
    }

    /// `Π x^w` over non-zero weights, scaled by `bias` when it is non-zero.
    pub fn weighted_product(&self, record: &KeyMetadata, now: u64) -> f64 {
        let scale = if self.bias == 0.0 { 1.0 } else { self.bias };
        self.terms(record, now)
            .iter()
            .filter(|(w, _)| *w != 0.0)
            .fold(scale, |acc, (w, x)| acc * x.powf(*w))
    }
}

/// Arithmetic shape of a policy's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreFormula {
    WeightedSum(Weights),
    WeightedProduct(Weights),
    /// Weighted sum over weighted sum.
    Ratio {
        numerator: Weights,
        denominator: Weights,
    },
    /// Exponential recency decay, log-scaled frequency and inverse size,
    /// combined linearly.
    Decayed {
        /// Recency scale in accesses: the term is `exp(-age / recency_half_life)`
        recency_half_life: f64,
        /// Frequency cap for log normalisation
        max_frequency: f64,
        /// Size at which the size term is 0.5
        baseline_size: f64,
        /// Weights for (recency, frequency, size)
        weights: (f64, f64, f64),
    },
}

impl ScoreFormula {
    /// Default decayed composite: recency and frequency dominate, size breaks
    /// near-ties.
    pub fn decayed() -> Self {
        Self::Decayed {
            recency_half_life: 1000.0,
            max_frequency: 1000.0,
            baseline_size: 4096.0,
            weights: (0.4, 0.4, 0.2),
        }
    }

    pub fn score(&self, record: &KeyMetadata, now: u64) -> f64 {
        match self {
            Self::WeightedSum(w) => w.weighted_sum(record, now),
            Self::WeightedProduct(w) => w.weighted_product(record, now),
            Self::Ratio { numerator, denominator } => {
                numerator.weighted_sum(record, now) / denominator.weighted_sum(record, now)
            }
            Self::Decayed {
                recency_half_life,
                max_frequency,
                baseline_size,
                weights,
            } => {
                let recency = (-(record.age(now) as f64) / recency_half_life).exp();

                let frequency = if record.frequency <= 0.0 {
                    0.0
                } else {
                    let count = record.frequency.min(*max_frequency);
                    (1.0 + count).ln() / (1.0 + max_frequency).ln()
                };

                let size_ratio = record.size as f64 / baseline_size;
                let size_score = 1.0 / (1.0 + size_ratio);

                recency * weights.0 + frequency * weights.1 + size_score * weights.2
            }
        }
    }
}

/// Which end of the score range is evicted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VictimOrder {
    /// Score is a value: evict the lowest.
    #[default]
    Lowest,
    /// Score is a distance/cost: evict the highest.
    Highest,
}

impl VictimOrder {
    /// Order two scores so that `Less` means "evict `a` before `b`".
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Self::Lowest => ord,
            Self::Highest => ord.reverse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::metadata::InitialValues;

    fn make_record(last_access: u64, frequency: f64, size: u64) -> KeyMetadata {
        let mut record = KeyMetadata::new(&InitialValues::default(), last_access, 0, size);
        record.frequency = frequency;
        record
    }

    #[test]
    fn test_weighted_sum() {
        let weights = Weights {
            bias: 1.0,
            frequency: 2.0,
            age: -0.5,
            ..Default::default()
        };
        let record = make_record(10, 3.0, 1);
        // 1 + 2*3 - 0.5*4
        assert_eq!(weights.weighted_sum(&record, 14), 5.0);
    }

    #[test]
    fn test_unused_inverse_frequency_ignored_at_zero() {
        let weights = Weights {
            age: 1.0,
            ..Default::default()
        };
        let record = make_record(2, 0.0, 1);
        assert_eq!(weights.weighted_sum(&record, 5), 3.0);

        let inverse = Weights {
            inverse_frequency: 0.5,
            ..Default::default()
        };
        assert!(inverse.weighted_sum(&record, 5).is_infinite());
        assert_eq!(inverse.weighted_sum(&make_record(2, 4.0, 1), 5), 0.125);
    }

    #[test]
    fn test_weighted_product_skips_zero_weights() {
        let weights = Weights {
            frequency: 1.0,
            reinforcement: 2.0,
            ..Default::default()
        };
        let mut record = make_record(0, 3.0, 1);
        record.reinforcement = 2.0;
        // age is 0 but has weight 0, so it does not zero the product
        assert_eq!(weights.weighted_product(&record, 0), 12.0);
    }

    #[test]
    fn test_weighted_product_inverse_of_zero_is_infinite() {
        let weights = Weights {
            age: -1.0,
            ..Default::default()
        };
        let record = make_record(5, 1.0, 1);
        assert!(weights.weighted_product(&record, 5).is_infinite());
    }

    #[test]
    fn test_ratio_zero_denominator_is_not_finite() {
        let formula = ScoreFormula::Ratio {
            numerator: Weights { frequency: 1.0, ..Default::default() },
            denominator: Weights { age: 1.0, ..Default::default() },
        };
        let record = make_record(7, 2.0, 1);
        assert!(!formula.score(&record, 7).is_finite());
        assert_eq!(formula.score(&record, 9), 1.0);
    }

    #[test]
    fn test_decayed_prefers_old_unused_items() {
        let formula = ScoreFormula::decayed();

        let old_unused = make_record(0, 0.0, 1024);
        let hot = make_record(9_990, 100.0, 1024);

        let score_old = formula.score(&old_unused, 10_000);
        let score_hot = formula.score(&hot, 10_000);

        assert!(score_old < score_hot, "old unused item should have lower score (evict first)");
    }

    #[test]
    fn test_decayed_prefers_large_items() {
        let formula = ScoreFormula::decayed();

        let small = make_record(100, 10.0, 1024);
        let large = make_record(100, 10.0, 10 * 1024 * 1024);

        assert!(formula.score(&large, 200) < formula.score(&small, 200));
    }

    #[test]
    fn test_victim_order_compare() {
        assert_eq!(VictimOrder::Lowest.compare(1.0, 2.0), Ordering::Less);
        assert_eq!(VictimOrder::Highest.compare(1.0, 2.0), Ordering::Greater);
        assert_eq!(VictimOrder::Highest.compare(2.0, 2.0), Ordering::Equal);
    }

    #[test]
    fn test_formula_from_json() {
        let formula: ScoreFormula = serde_json::from_str(
            r#"{"kind": "weighted_sum", "frequency": 1.0, "recency": 0.5}"#,
        )
        .unwrap();

        assert_eq!(
            formula,
            ScoreFormula::WeightedSum(Weights {
                frequency: 1.0,
                recency: 0.5,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_ratio_from_json() {
        let formula: ScoreFormula = serde_json::from_str(
            r#"{"kind": "ratio", "numerator": {"frequency": 1.0}, "denominator": {"bias": 1.0, "age": 1.0}}"#,
        )
        .unwrap();
        assert!(matches!(formula, ScoreFormula::Ratio { .. }));
    }
}
