// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded simulated cache driving an [`EvictionPolicy`].
//!
//! # Access path
//!
//! ```text
//! get(obj)
//!   access_count += 1
//!   ├─ hit  → hit_count += 1, policy.on_hit                     → true
//!   └─ miss
//!        ├─ obj.size > capacity → not admitted                   → false
//!        └─ while obj.size > capacity - used:
//!             victim = policy.select_victim   (must be cached)
//!             remove victim, policy.on_evict
//!           insert obj, policy.on_insert                         → false
//! ```
//!
//! The policy only ever sees the cache through [`CacheSnapshot`], and every
//! hook runs against a state that already reflects the event (the victim is
//! gone before `on_evict`, the object is present before `on_insert`).

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::metrics;
use crate::object::CacheObject;
use crate::policy::{EvictionPolicy, PolicyError};
use crate::snapshot::CacheSnapshot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("Policy chose victim '{key}' which is not in the cache")]
    InvalidVictim { key: String },
}

/// Counters and contents, split from the policy so hooks can borrow both.
#[derive(Debug, Default)]
struct CacheState {
    objects: HashMap<String, CacheObject>,
    capacity: u64,
    used: u64,
    access_count: u64,
    hit_count: u64,
}

impl CacheState {
    fn insert(&mut self, obj: CacheObject) {
        self.used += obj.size();
        self.objects.insert(obj.key().to_string(), obj);
    }

    fn remove(&mut self, key: &str) -> Option<CacheObject> {
        let obj = self.objects.remove(key)?;
        self.used -= obj.size();
        Some(obj)
    }

    /// `used <= capacity` always holds, so this never underflows.
    fn free(&self) -> u64 {
        self.capacity - self.used
    }
}

impl CacheSnapshot for CacheState {
    fn cache(&self) -> &HashMap<String, CacheObject> {
        &self.objects
    }

    fn access_count(&self) -> u64 {
        self.access_count
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn size(&self) -> u64 {
        self.used
    }

    fn hit_count(&self) -> u64 {
        self.hit_count
    }
}

/// Simulated cache of fixed capacity.
///
/// # Example
///
/// ```
/// use scored_eviction::{Cache, CacheObject, CacheSnapshot, Preset};
///
/// let mut cache = Cache::new(2, Preset::Lru.build().unwrap());
/// let a = CacheObject::unit("a").unwrap();
/// let b = CacheObject::unit("b").unwrap();
/// let c = CacheObject::unit("c").unwrap();
///
/// assert!(!cache.get(&a).unwrap());
/// assert!(!cache.get(&b).unwrap());
/// assert!(cache.get(&a).unwrap());
/// assert!(!cache.get(&c).unwrap()); // evicts "b"
///
/// assert!(cache.contains("a"));
/// assert!(!cache.contains("b"));
/// assert_eq!(cache.miss_count(), 3);
/// ```
#[derive(Debug)]
pub struct Cache<P: EvictionPolicy> {
    state: CacheState,
    policy: P,
}

impl<P: EvictionPolicy> Cache<P> {
    pub fn new(capacity: u64, policy: P) -> Self {
        Self {
            state: CacheState {
                capacity,
                ..Default::default()
            },
            policy,
        }
    }

    /// Access `obj`. Returns `true` on a hit.
    ///
    /// A miss whose object is larger than the whole cache is counted but
    /// not admitted, and the policy is not consulted.
    pub fn get(&mut self, obj: &CacheObject) -> Result<bool, CacheError> {
        self.state.access_count += 1;

        if self.state.objects.contains_key(obj.key()) {
            self.state.hit_count += 1;
            let result = self.policy.on_hit(&self.state, obj);
            self.check(result)?;
            metrics::record_access(self.policy.name(), true);
            return Ok(true);
        }

        metrics::record_access(self.policy.name(), false);

        if obj.size() > self.state.capacity {
            debug!(
                key = obj.key(),
                size = obj.size(),
                capacity = self.state.capacity,
                "Object larger than cache, not admitted"
            );
            metrics::record_rejected(self.policy.name());
            return Ok(false);
        }

        while obj.size() > self.state.free() {
            self.evict_one(obj)?;
        }

        self.state.insert(obj.clone());
        let result = self.policy.on_insert(&self.state, obj);
        self.check(result)?;

        trace!(key = obj.key(), used = self.state.used, "Object admitted");
        metrics::set_cache_bytes(self.policy.name(), self.state.used);
        metrics::set_tracked_keys(self.policy.name(), self.policy.tracked_keys());
        Ok(false)
    }

    fn evict_one(&mut self, incoming: &CacheObject) -> Result<(), CacheError> {
        let result = self.policy.select_victim(&self.state, incoming);
        let victim = self.check(result)?;

        let evicted = match self.state.remove(&victim) {
            Some(evicted) => evicted,
            None => {
                warn!(policy = self.policy.name(), victim = %victim, "Policy returned a key that is not cached");
                return Err(CacheError::InvalidVictim { key: victim });
            }
        };

        let result = self.policy.on_evict(&self.state, incoming, &evicted);
        self.check(result)?;

        trace!(victim = %victim, incoming = incoming.key(), "Evicted");
        metrics::record_eviction(self.policy.name(), evicted.size());
        Ok(())
    }

    /// Count a failed hook before propagating it.
    fn check<T>(&self, result: Result<T, PolicyError>) -> Result<T, CacheError> {
        result.map_err(|e| {
            warn!(policy = self.policy.name(), error = %e, "Policy hook failed");
            metrics::record_policy_error(self.policy.name(), e.kind());
            CacheError::from(e)
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn into_policy(self) -> P {
        self.policy
    }

    /// Current contents, in no particular order.
    pub fn objects(&self) -> impl Iterator<Item = &CacheObject> {
        self.state.objects.values()
    }
}

impl<P: EvictionPolicy> CacheSnapshot for Cache<P> {
    fn cache(&self) -> &HashMap<String, CacheObject> {
        self.state.cache()
    }

    fn access_count(&self) -> u64 {
        self.state.access_count()
    }

    fn capacity(&self) -> u64 {
        self.state.capacity()
    }

    fn size(&self) -> u64 {
        self.state.size()
    }

    fn hit_count(&self) -> u64 {
        self.state.hit_count()
    }

    fn miss_count(&self) -> u64 {
        self.state.miss_count()
    }

    fn contains(&self, key: &str) -> bool {
        self.state.contains(key)
    }
}
