// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Generic scored eviction policy.
//!
//! [`ScoredPolicy`] covers the whole family of "compute a score per key,
//! evict the extreme" policies: the score function, the direction, the
//! initial record values and the update arithmetic are all data
//! ([`ScoredPolicyConfig`]), so a new policy is a new config, not new code.
//!
//! # Strategy
//!
//! ```text
//! select_victim:  score every cached key, evict min (or max)
//!                 ties → older last_access → earlier insert
//! on_hit:         frequency += inc, last_access = now,
//!                 decay *= d (<1), reinforcement *= r (>1)
//! on_insert:      new record from InitialValues
//! on_evict:       drop record, then optionally decay / bump /
//!                 normalise the survivors
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::metadata::{InitialValues, KeyMetadata, MetadataStore};
use super::scoring::{ScoreFormula, VictimOrder};
use super::{EvictionPolicy, PolicyError};
use crate::object::CacheObject;
use crate::snapshot::CacheSnapshot;

/// How records change on hit and eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRules {
    /// Added to `frequency` on every hit (must be >= 0)
    #[serde(default = "default_hit_increment")]
    pub hit_increment: f64,
    /// Whether a hit moves `last_access` to now (false gives FIFO behaviour)
    #[serde(default = "default_refresh_recency_on_hit")]
    pub refresh_recency_on_hit: bool,
    /// `decay` is multiplied by this on every hit
    #[serde(default = "default_factor")]
    pub hit_decay_factor: f64,
    /// `reinforcement` is multiplied by this on every hit
    #[serde(default = "default_factor")]
    pub hit_reinforcement_factor: f64,
    /// Every survivor's `decay` is multiplied by this after an eviction
    #[serde(default = "default_factor")]
    pub survivor_decay_factor: f64,
    /// Added to every survivor's `reinforcement` after an eviction
    #[serde(default)]
    pub survivor_competition_increment: f64,
    /// Divide survivor frequencies by the largest one after an eviction
    #[serde(default)]
    pub normalize_frequency: bool,
}

fn default_hit_increment() -> f64 { 1.0 }
fn default_refresh_recency_on_hit() -> bool { true }
fn default_factor() -> f64 { 1.0 }

impl Default for UpdateRules {
    fn default() -> Self {
        Self {
            hit_increment: default_hit_increment(),
            refresh_recency_on_hit: default_refresh_recency_on_hit(),
            hit_decay_factor: default_factor(),
            hit_reinforcement_factor: default_factor(),
            survivor_decay_factor: default_factor(),
            survivor_competition_increment: 0.0,
            normalize_frequency: false,
        }
    }
}

/// Full description of a scored policy.
///
/// # Example
///
/// ```
/// use scored_eviction::{ScoredPolicy, ScoredPolicyConfig};
///
/// let config: ScoredPolicyConfig = serde_json::from_str(r#"{
///     "name": "frequency-then-recency",
///     "formula": {"kind": "weighted_sum", "frequency": 1.0, "recency": 0.001}
/// }"#).unwrap();
///
/// let policy = ScoredPolicy::new(config).unwrap();
/// assert_eq!(policy.config().name, "frequency-then-recency");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPolicyConfig {
    pub name: String,
    pub formula: ScoreFormula,
    #[serde(default)]
    pub order: VictimOrder,
    #[serde(default)]
    pub initial: InitialValues,
    #[serde(default)]
    pub rules: UpdateRules,
}

impl ScoredPolicyConfig {
    pub fn new(name: impl Into<String>, formula: ScoreFormula) -> Self {
        Self {
            name: name.into(),
            formula,
            order: VictimOrder::default(),
            initial: InitialValues::default(),
            rules: UpdateRules::default(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: VictimOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn with_initial(mut self, initial: InitialValues) -> Self {
        self.initial = initial;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: UpdateRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        let invalid = |reason: &str| PolicyError::InvalidConfig {
            policy: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        let rules = &self.rules;
        if !(rules.hit_increment >= 0.0 && rules.hit_increment.is_finite()) {
            return Err(invalid("hit_increment must be finite and >= 0"));
        }
        let factors = [
            rules.hit_decay_factor,
            rules.hit_reinforcement_factor,
            rules.survivor_decay_factor,
            rules.survivor_competition_increment,
        ];
        if factors.iter().any(|f| !f.is_finite()) {
            return Err(invalid("update factors must be finite"));
        }
        let initial = &self.initial;
        if ![initial.frequency, initial.decay, initial.reinforcement]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(invalid("initial values must be finite"));
        }
        if let ScoreFormula::Decayed { recency_half_life, max_frequency, baseline_size, .. } = &self.formula {
            if *recency_half_life <= 0.0 || *max_frequency <= 0.0 || *baseline_size <= 0.0 {
                return Err(invalid("decayed formula parameters must be positive"));
            }
        }
        Ok(())
    }
}

/// Clamp a repeatedly compounded field to the finite range.
fn saturate(value: f64) -> f64 {
    value.clamp(-f64::MAX, f64::MAX)
}

/// Scored eviction policy with an owned metadata store.
#[derive(Debug, Clone)]
pub struct ScoredPolicy {
    config: ScoredPolicyConfig,
    store: MetadataStore,
}

impl ScoredPolicy {
    pub fn new(config: ScoredPolicyConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(Self {
            config,
            store: MetadataStore::new(),
        })
    }

    pub fn config(&self) -> &ScoredPolicyConfig {
        &self.config
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.store
    }

    /// Current score of a tracked key.
    pub fn score_of(&self, key: &str, now: u64) -> Option<f64> {
        self.store.get(key).map(|record| self.config.formula.score(record, now))
    }

    /// Whether `(score, record)` should be evicted before the incumbent.
    fn ranks_before(&self, score: f64, record: &KeyMetadata, best_score: f64, best: &KeyMetadata) -> bool {
        self.config
            .order
            .compare(score, best_score)
            .then(record.last_access.cmp(&best.last_access))
            .then(record.sequence.cmp(&best.sequence))
            == Ordering::Less
    }

    fn untracked(key: &str) -> PolicyError {
        PolicyError::UntrackedKey { key: key.to_string() }
    }
}

impl EvictionPolicy for ScoredPolicy {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn select_victim(
        &self,
        snapshot: &dyn CacheSnapshot,
        _incoming: &CacheObject,
    ) -> Result<String, PolicyError> {
        let now = snapshot.access_count();
        let mut best: Option<(&str, f64, &KeyMetadata)> = None;

        for key in snapshot.cache().keys() {
            let record = self.store.get(key).ok_or_else(|| Self::untracked(key))?;
            let score = self.config.formula.score(record, now);
            if !score.is_finite() {
                return Err(PolicyError::NonFiniteScore { key: key.clone(), score });
            }

            let replace = match best {
                None => true,
                Some((_, best_score, best_record)) => {
                    self.ranks_before(score, record, best_score, best_record)
                }
            };
            if replace {
                best = Some((key.as_str(), score, record));
            }
        }

        let (victim, score, _) = best.ok_or(PolicyError::EmptyCache)?;
        debug!(policy = %self.config.name, victim, score, "Selected eviction victim");
        Ok(victim.to_string())
    }

    fn on_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError> {
        let now = snapshot.access_count();
        let rules = &self.config.rules;
        let record = self
            .store
            .get_mut(obj.key())
            .ok_or_else(|| Self::untracked(obj.key()))?;

        record.frequency = saturate(record.frequency + rules.hit_increment);
        if rules.refresh_recency_on_hit {
            record.last_access = now;
        }
        record.decay = saturate(record.decay * rules.hit_decay_factor);
        record.reinforcement = saturate(record.reinforcement * rules.hit_reinforcement_factor);

        trace!(key = obj.key(), frequency = record.frequency, "Hit recorded");
        Ok(())
    }

    fn on_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError> {
        let now = snapshot.access_count();
        if !self.store.insert(obj.key(), &self.config.initial, now, obj.size()) {
            return Err(PolicyError::AlreadyTracked { key: obj.key().to_string() });
        }
        trace!(key = obj.key(), now, "Insert recorded");
        Ok(())
    }

    fn on_evict(
        &mut self,
        _snapshot: &dyn CacheSnapshot,
        _incoming: &CacheObject,
        evicted: &CacheObject,
    ) -> Result<(), PolicyError> {
        self.store
            .remove(evicted.key())
            .ok_or_else(|| Self::untracked(evicted.key()))?;

        let rules = &self.config.rules;
        if rules.survivor_decay_factor != 1.0 || rules.survivor_competition_increment != 0.0 {
            for record in self.store.values_mut() {
                record.decay = saturate(record.decay * rules.survivor_decay_factor);
                record.reinforcement = saturate(record.reinforcement + rules.survivor_competition_increment);
            }
        }

        if rules.normalize_frequency {
            if let Some(max) = self.store.max_frequency().filter(|max| *max > 0.0) {
                for record in self.store.values_mut() {
                    record.frequency /= max;
                }
            }
        }

        trace!(key = evicted.key(), survivors = self.store.len(), "Eviction recorded");
        Ok(())
    }

    fn tracked_keys(&self) -> usize {
        self.store.len()
    }
}
