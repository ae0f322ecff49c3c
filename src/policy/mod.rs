// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Eviction policies.
//!
//! A policy keeps per-key metadata, picks a victim when the cache is full,
//! and updates its metadata when the cache reports a hit, an insert or an
//! eviction.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Policy Module                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  mod.rs       - EvictionPolicy trait + PolicyError           │
//! │  metadata.rs  - KeyMetadata record, owned MetadataStore      │
//! │  scoring.rs   - ScoreFormula: record → f64                   │
//! │  └─ WeightedSum / WeightedProduct / Ratio / Decayed          │
//! │  └─ VictimOrder: evict lowest or highest                     │
//! │  scored.rs    - ScoredPolicy: formula + update rules + store │
//! │  presets.rs   - FIFO, LRU, LFU and composite presets         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key lifecycle
//!
//! ```text
//! ABSENT ──on_insert──▶ PRESENT ──on_hit (any number)──▶ PRESENT ──on_evict──▶ ABSENT
//! ```
//!
//! Every hook fails fast with a [`PolicyError`]; nothing is retried or
//! silently defaulted.

pub mod metadata;
pub mod presets;
pub mod scored;
pub mod scoring;

use thiserror::Error;

use crate::object::CacheObject;
use crate::snapshot::CacheSnapshot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    #[error("Cannot select a victim from an empty cache")]
    EmptyCache,
    #[error("No metadata tracked for key '{key}'")]
    UntrackedKey { key: String },
    #[error("Metadata already tracked for key '{key}'")]
    AlreadyTracked { key: String },
    #[error("Score for key '{key}' is not finite ({score})")]
    NonFiniteScore { key: String, score: f64 },
    #[error("Invalid policy '{policy}': {reason}")]
    InvalidConfig { policy: String, reason: String },
}

impl PolicyError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCache => "empty_cache",
            Self::UntrackedKey { .. } => "untracked_key",
            Self::AlreadyTracked { .. } => "already_tracked",
            Self::NonFiniteScore { .. } => "non_finite_score",
            Self::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// The eviction contract between a cache and its replacement policy.
///
/// The cache calls exactly one hook at a time:
/// - [`select_victim`](Self::select_victim) when it must make room,
/// - [`on_evict`](Self::on_evict) right after removing the victim,
/// - [`on_insert`](Self::on_insert) right after admitting an object,
/// - [`on_hit`](Self::on_hit) on every hit.
pub trait EvictionPolicy {
    fn name(&self) -> &str;

    /// Pick the key to evict to make room for `incoming`. Read-only.
    fn select_victim(
        &self,
        snapshot: &dyn CacheSnapshot,
        incoming: &CacheObject,
    ) -> Result<String, PolicyError>;

    fn on_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError>;

    fn on_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError>;

    /// `incoming` has not been inserted yet; `evicted` is already gone from
    /// `snapshot`.
    fn on_evict(
        &mut self,
        snapshot: &dyn CacheSnapshot,
        incoming: &CacheObject,
        evicted: &CacheObject,
    ) -> Result<(), PolicyError>;

    /// Number of keys with live metadata.
    fn tracked_keys(&self) -> usize;
}

impl<P: EvictionPolicy + ?Sized> EvictionPolicy for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn select_victim(
        &self,
        snapshot: &dyn CacheSnapshot,
        incoming: &CacheObject,
    ) -> Result<String, PolicyError> {
        (**self).select_victim(snapshot, incoming)
    }

    fn on_hit(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError> {
        (**self).on_hit(snapshot, obj)
    }

    fn on_insert(&mut self, snapshot: &dyn CacheSnapshot, obj: &CacheObject) -> Result<(), PolicyError> {
        (**self).on_insert(snapshot, obj)
    }

    fn on_evict(
        &mut self,
        snapshot: &dyn CacheSnapshot,
        incoming: &CacheObject,
        evicted: &CacheObject,
    ) -> Result<(), PolicyError> {
        (**self).on_evict(snapshot, incoming, evicted)
    }

    fn tracked_keys(&self) -> usize {
        (**self).tracked_keys()
    }
}
