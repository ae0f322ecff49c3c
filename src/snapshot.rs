// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read-only view of cache state handed to eviction policies.
//!
//! Policies never see the cache itself, only this narrow view: the current
//! key → object map and the global counters. The simulated
//! [`Cache`](crate::Cache) implements it, and [`StaticSnapshot`] lets callers
//! drive a policy without a cache at all.

use std::collections::HashMap;

use crate::object::CacheObject;

/// Read-only cache state consulted by eviction policies.
pub trait CacheSnapshot {
    /// Currently cached objects by key.
    fn cache(&self) -> &HashMap<String, CacheObject>;

    /// Logical clock: total accesses seen so far (hits + misses).
    fn access_count(&self) -> u64;

    /// Capacity in size units.
    fn capacity(&self) -> u64;

    /// Sum of cached object sizes.
    fn size(&self) -> u64;

    fn hit_count(&self) -> u64;

    fn miss_count(&self) -> u64 {
        self.access_count().saturating_sub(self.hit_count())
    }

    fn contains(&self, key: &str) -> bool {
        self.cache().contains_key(key)
    }

    fn len(&self) -> usize {
        self.cache().len()
    }

    fn is_empty(&self) -> bool {
        self.cache().is_empty()
    }
}

/// Owned snapshot with caller-controlled counters.
///
/// # Example
///
/// ```
/// use scored_eviction::{CacheObject, CacheSnapshot, StaticSnapshot};
///
/// let mut snapshot = StaticSnapshot::new(10);
/// snapshot.put(CacheObject::unit("a").unwrap());
/// snapshot.tick();
///
/// assert!(snapshot.contains("a"));
/// assert_eq!(snapshot.size(), 1);
/// assert_eq!(snapshot.access_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshot {
    objects: HashMap<String, CacheObject>,
    capacity: u64,
    access_count: u64,
    hit_count: u64,
}

impl StaticSnapshot {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Add or replace an object, returning the previous one.
    pub fn put(&mut self, obj: CacheObject) -> Option<CacheObject> {
        self.objects.insert(obj.key().to_string(), obj)
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheObject> {
        self.objects.remove(key)
    }

    /// Advance the logical clock by one access.
    pub fn tick(&mut self) {
        self.access_count += 1;
    }

    /// Advance the logical clock and count the access as a hit.
    pub fn tick_hit(&mut self) {
        self.access_count += 1;
        self.hit_count += 1;
    }

    pub fn set_access_count(&mut self, access_count: u64) {
        self.access_count = access_count;
        self.hit_count = self.hit_count.min(access_count);
    }
}

impl CacheSnapshot for StaticSnapshot {
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
        self.objects.values().map(CacheObject::size).sum()
    }

    fn hit_count(&self) -> u64 {
        self.hit_count
    }
}
