// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Ready-made policy configurations.
//!
//! Classic baselines (FIFO, LRU, LFU) fall out of the scored policy as
//! single-feature sums; the composite presets reproduce the recurring
//! shapes: a plain weighted sum, an inverse-frequency cost evicted from the
//! top, a popularity/age ratio with survivor decay, and a decayed composite.
//!
//! # Example
//!
//! ```
//! use scored_eviction::{EvictionPolicy, Preset};
//!
//! let preset: Preset = "lru".parse().unwrap();
//! let policy = preset.build().unwrap();
//! assert_eq!(policy.name(), "lru");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::metadata::InitialValues;
use super::scored::{ScoredPolicy, ScoredPolicyConfig, UpdateRules};
use super::scoring::{ScoreFormula, VictimOrder, Weights};
use super::PolicyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Fifo,
    Lru,
    Lfu,
    WeightedFrequencyRecency,
    InverseFrequency,
    PopularityRatio,
    DecayedComposite,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Self::Fifo,
        Self::Lru,
        Self::Lfu,
        Self::WeightedFrequencyRecency,
        Self::InverseFrequency,
        Self::PopularityRatio,
        Self::DecayedComposite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "fifo",
            Self::Lru => "lru",
            Self::Lfu => "lfu",
            Self::WeightedFrequencyRecency => "weighted_frequency_recency",
            Self::InverseFrequency => "inverse_frequency",
            Self::PopularityRatio => "popularity_ratio",
            Self::DecayedComposite => "decayed_composite",
        }
    }

    pub fn config(&self) -> ScoredPolicyConfig {
        let name = self.as_str();
        match self {
            // Hits never move the timestamp, so recency stays insertion time
            Self::Fifo => ScoredPolicyConfig::new(
                name,
                ScoreFormula::WeightedSum(Weights { recency: 1.0, ..Default::default() }),
            )
            .with_rules(UpdateRules {
                refresh_recency_on_hit: false,
                ..Default::default()
            }),

            Self::Lru => ScoredPolicyConfig::new(
                name,
                ScoreFormula::WeightedSum(Weights { recency: 1.0, ..Default::default() }),
            ),

            // Equal frequencies fall back to the older access
            Self::Lfu => ScoredPolicyConfig::new(
                name,
                ScoreFormula::WeightedSum(Weights { frequency: 1.0, ..Default::default() }),
            ),

            Self::WeightedFrequencyRecency => ScoredPolicyConfig::new(
                name,
                ScoreFormula::WeightedSum(Weights {
                    frequency: 1.0,
                    recency: 1.0,
                    reinforcement: 1.0,
                    ..Default::default()
                }),
            ),

            Self::InverseFrequency => ScoredPolicyConfig::new(
                name,
                ScoreFormula::WeightedSum(Weights {
                    inverse_frequency: 0.5,
                    decay: 0.3,
                    reinforcement: -0.2,
                    ..Default::default()
                }),
            )
            .with_order(VictimOrder::Highest)
            .with_rules(UpdateRules {
                hit_decay_factor: 0.5,
                hit_reinforcement_factor: 1.5,
                ..Default::default()
            }),

            // Bias keeps the denominator positive at age zero
            Self::PopularityRatio => ScoredPolicyConfig::new(
                name,
                ScoreFormula::Ratio {
                    numerator: Weights { frequency: 1.0, reinforcement: 1.0, ..Default::default() },
                    denominator: Weights { bias: 1.0, age: 1.0, decay: 1.0, ..Default::default() },
                },
            )
            .with_initial(InitialValues {
                frequency: 1.0,
                decay: 0.1,
                reinforcement: 1.0,
            })
            .with_rules(UpdateRules {
                survivor_decay_factor: 0.9,
                ..Default::default()
            }),

            Self::DecayedComposite => ScoredPolicyConfig::new(name, ScoreFormula::decayed()),
        }
    }

    pub fn build(&self) -> Result<ScoredPolicy, PolicyError> {
        ScoredPolicy::new(self.config())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == wanted)
            .ok_or_else(|| PolicyError::InvalidConfig {
                policy: s.to_string(),
                reason: "unknown preset".to_string(),
            })
    }
}
