// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Property-based tests for the eviction contract.
//!
//! Random access sequences are driven through a real `Cache` so every hook
//! is exercised in the order a cache raises them.
//!
//! Run with: `cargo test --test proptest_lifecycle`

use proptest::prelude::*;

use scored_eviction::{
    Cache, CacheObject, CacheSnapshot, EvictionPolicy, Preset, ScoreFormula, ScoredPolicy,
    ScoredPolicyConfig, VictimOrder, Weights,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Accesses over a small key space so hits and evictions both happen.
fn access_strategy() -> impl Strategy<Value = Vec<CacheObject>> {
    prop::collection::vec((0u8..12, 1u64..5), 1..200).prop_map(|accesses| {
        accesses
            .into_iter()
            .map(|(key, size)| CacheObject::new(format!("k{key}"), size, true).unwrap())
            .collect()
    })
}

fn preset_strategy() -> impl Strategy<Value = Preset> {
    prop::sample::select(Preset::ALL.to_vec())
}

/// Weighted-sum policy with arbitrary finite weights.
fn weighted_config_strategy() -> impl Strategy<Value = ScoredPolicyConfig> {
    (
        prop::collection::vec(-2.0f64..2.0, 6),
        any::<bool>(),
    )
        .prop_map(|(w, highest)| {
            let weights = Weights {
                bias: 0.0,
                frequency: w[0],
                inverse_frequency: w[1],
                recency: w[2],
                age: w[3],
                decay: w[4],
                reinforcement: w[5],
                size: 0.0,
            };
            let order = if highest { VictimOrder::Highest } else { VictimOrder::Lowest };
            ScoredPolicyConfig::new("random", ScoreFormula::WeightedSum(weights)).with_order(order)
        })
}

fn policy_strategy() -> impl Strategy<Value = ScoredPolicyConfig> {
    prop_oneof![
        preset_strategy().prop_map(|p| p.config()),
        weighted_config_strategy(),
    ]
}

fn assert_tracks_exactly_cached(cache: &Cache<ScoredPolicy>) -> Result<(), TestCaseError> {
    let metadata = cache.policy().metadata();
    prop_assert_eq!(metadata.len(), cache.len());
    for key in cache.cache().keys() {
        prop_assert!(metadata.contains(key), "cached key {} has no metadata", key);
    }
    Ok(())
}

// =============================================================================
// Key lifecycle
// =============================================================================

proptest! {
    /// Metadata exists exactly for keys that were inserted and not evicted
    #[test]
    fn prop_metadata_tracks_cache_contents(
        config in policy_strategy(),
        accesses in access_strategy(),
        capacity in 1u64..16,
    ) {
        let mut cache = Cache::new(capacity, ScoredPolicy::new(config).unwrap());
        for obj in &accesses {
            cache.get(obj).unwrap();
            assert_tracks_exactly_cached(&cache)?;
        }
    }

    /// Occupancy never exceeds capacity
    #[test]
    fn prop_capacity_never_exceeded(
        preset in preset_strategy(),
        accesses in access_strategy(),
        capacity in 1u64..16,
    ) {
        let mut cache = Cache::new(capacity, preset.build().unwrap());
        for obj in &accesses {
            cache.get(obj).unwrap();
            prop_assert!(cache.size() <= cache.capacity());
        }
        prop_assert_eq!(cache.hit_count() + cache.miss_count(), accesses.len() as u64);
    }

    /// A hit never lowers the key's frequency
    #[test]
    fn prop_frequency_monotonic_on_hit(
        config in policy_strategy(),
        accesses in access_strategy(),
        capacity in 1u64..16,
    ) {
        let mut cache = Cache::new(capacity, ScoredPolicy::new(config).unwrap());
        for obj in &accesses {
            let before = cache.policy().metadata().get(obj.key()).map(|m| m.frequency);
            let hit = cache.get(obj).unwrap();
            if hit {
                let after = cache.policy().metadata().get(obj.key()).map(|m| m.frequency);
                prop_assert!(after >= before);
            }
        }
    }
}

// =============================================================================
// Victim selection
// =============================================================================

proptest! {
    /// The victim is always a cached key, and asking twice gives the same answer
    #[test]
    fn prop_victim_valid_and_deterministic(
        config in policy_strategy(),
        accesses in access_strategy(),
        capacity in 1u64..16,
    ) {
        let mut cache = Cache::new(capacity, ScoredPolicy::new(config).unwrap());
        for obj in &accesses {
            cache.get(obj).unwrap();
        }
        prop_assume!(!cache.is_empty());

        let incoming = CacheObject::unit("incoming").unwrap();
        let tracked = cache.policy().tracked_keys();
        let first = cache.policy().select_victim(&cache, &incoming).unwrap();
        let second = cache.policy().select_victim(&cache, &incoming).unwrap();

        prop_assert!(cache.contains(&first));
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(cache.policy().tracked_keys(), tracked);
    }

    /// Two independent instances fed the same accesses end in the same state
    #[test]
    fn prop_independent_replays_agree(
        config in policy_strategy(),
        accesses in access_strategy(),
        capacity in 1u64..16,
    ) {
        let mut left = Cache::new(capacity, ScoredPolicy::new(config.clone()).unwrap());
        let mut right = Cache::new(capacity, ScoredPolicy::new(config).unwrap());

        for obj in &accesses {
            prop_assert_eq!(left.get(obj).unwrap(), right.get(obj).unwrap());
        }

        let mut left_keys: Vec<&String> = left.cache().keys().collect();
        let mut right_keys: Vec<&String> = right.cache().keys().collect();
        left_keys.sort();
        right_keys.sort();
        prop_assert_eq!(left_keys, right_keys);
    }
}
