// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-key metadata records and the store that owns them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Baseline values for a freshly inserted record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialValues {
    #[serde(default = "default_initial_frequency")]
    pub frequency: f64,
    #[serde(default = "default_initial_decay")]
    pub decay: f64,
    #[serde(default = "default_initial_reinforcement")]
    pub reinforcement: f64,
}

fn default_initial_frequency() -> f64 { 1.0 }
fn default_initial_decay() -> f64 { 1.0 }
fn default_initial_reinforcement() -> f64 { 1.0 }

impl Default for InitialValues {
    fn default() -> Self {
        Self {
            frequency: default_initial_frequency(),
            decay: default_initial_decay(),
            reinforcement: default_initial_reinforcement(),
        }
    }
}

/// Metadata tracked for one cached key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetadata {
    /// Access frequency counter
    pub frequency: f64,
    /// Logical time of the last insert or hit
    pub last_access: u64,
    /// Logical time of insertion
    pub inserted_at: u64,
    /// Store-wide insertion number, unique per record
    pub sequence: u64,
    /// Shrinks on every hit
    pub decay: f64,
    /// Grows on every hit
    pub reinforcement: f64,
    /// Object size at insertion
    pub size: u64,
}

impl KeyMetadata {
    pub fn new(initial: &InitialValues, now: u64, sequence: u64, size: u64) -> Self {
        Self {
            frequency: initial.frequency,
            last_access: now,
            inserted_at: now,
            sequence,
            decay: initial.decay,
            reinforcement: initial.reinforcement,
            size,
        }
    }

    /// Logical ticks since the last access.
    #[inline]
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_access)
    }
}

/// Owned key → metadata map.
///
/// Each policy instance owns its store, so any number of policies can run
/// side by side in one process.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    records: HashMap<String, KeyMetadata>,
    next_sequence: u64,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record for `key`. Returns `false` (and leaves the store
    /// untouched) if the key is already tracked.
    pub fn insert(&mut self, key: &str, initial: &InitialValues, now: u64, size: u64) -> bool {
        if self.records.contains_key(key) {
            return false;
        }
        let record = KeyMetadata::new(initial, now, self.next_sequence, size);
        self.next_sequence += 1;
        self.records.insert(key.to_string(), record);
        true
    }

    pub fn get(&self, key: &str) -> Option<&KeyMetadata> {
        self.records.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut KeyMetadata> {
        self.records.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<KeyMetadata> {
        self.records.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyMetadata)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut KeyMetadata> {
        self.records.values_mut()
    }

    /// Largest frequency across all records, if any.
    pub fn max_frequency(&self) -> Option<f64> {
        self.records.values().map(|m| m.frequency).reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_assigns_increasing_sequence() {
        let mut store = MetadataStore::new();
        let initial = InitialValues::default();

        assert!(store.insert("a", &initial, 1, 1));
        assert!(store.insert("b", &initial, 1, 1));

        let a = store.get("a").unwrap().sequence;
        let b = store.get("b").unwrap().sequence;
        assert!(a < b);
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let mut store = MetadataStore::new();
        let initial = InitialValues::default();

        assert!(store.insert("a", &initial, 1, 1));
        store.get_mut("a").unwrap().frequency = 9.0;
        assert!(!store.insert("a", &initial, 5, 1));

        // Original record untouched
        assert_eq!(store.get("a").unwrap().frequency, 9.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_sequence_not_reused_after_remove() {
        let mut store = MetadataStore::new();
        let initial = InitialValues::default();

        store.insert("a", &initial, 0, 1);
        let first = store.remove("a").unwrap().sequence;
        store.insert("a", &initial, 3, 1);

        assert!(store.get("a").unwrap().sequence > first);
    }

    #[test]
    fn test_age_saturates() {
        let record = KeyMetadata::new(&InitialValues::default(), 10, 0, 1);
        assert_eq!(record.age(15), 5);
        assert_eq!(record.age(3), 0);
    }

    #[test]
    fn test_max_frequency() {
        let mut store = MetadataStore::new();
        assert_eq!(store.max_frequency(), None);

        let initial = InitialValues::default();
        store.insert("a", &initial, 0, 1);
        store.insert("b", &initial, 0, 1);
        store.get_mut("b").unwrap().frequency = 4.0;

        assert_eq!(store.max_frequency(), Some(4.0));
    }

    #[test]
    fn test_initial_values_defaults_from_empty_json() {
        let initial: InitialValues = serde_json::from_str("{}").unwrap();
        assert_eq!(initial, InitialValues::default());
    }
}
