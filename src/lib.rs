// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Scored Eviction
//!
//! Score-based cache eviction policies behind one four-hook contract, plus
//! a small simulated cache and trace replayer to evaluate them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Simulator (trace replay)                   │
//! │  • Loads delimited traces into CacheObjects                 │
//! │  • Reports miss ratio, compares policies, time-bounded      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                         get(obj)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Cache (fixed capacity)                   │
//! │  • Counts accesses and hits                                 │
//! │  • Evicts until the incoming object fits                    │
//! │  • Exposes itself only as a read-only CacheSnapshot         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!     select_victim / on_hit / on_insert / on_evict
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 EvictionPolicy (ScoredPolicy)               │
//! │  • Owned per-key metadata store                             │
//! │  • ScoreFormula over frequency, recency, decay, ...         │
//! │  • Deterministic tie-break, fail-fast errors                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use scored_eviction::{CacheObject, Preset, Simulator, SimulatorConfig};
//!
//! let trace: Vec<CacheObject> = ["a", "b", "a", "c", "a", "b"]
//!     .iter()
//!     .map(|k| CacheObject::unit(*k).unwrap())
//!     .collect();
//!
//! let mut simulator = Simulator::new(SimulatorConfig {
//!     capacity: 2,
//!     ..Default::default()
//! })
//! .unwrap();
//!
//! let fifo = simulator.run(Preset::Fifo.build().unwrap(), &trace).unwrap();
//! let lru = simulator.run(Preset::Lru.build().unwrap(), &trace).unwrap();
//! assert!(lru.reduction_against(&fifo).unwrap() > 0.0);
//! ```
//!
//! ## Modules
//!
//! - [`policy`]: The [`EvictionPolicy`] contract and [`ScoredPolicy`]
//! - [`snapshot`]: Read-only cache view handed to policies
//! - [`cache`]: Bounded simulated cache
//! - [`trace`]: Trace loading
//! - [`simulator`]: Trace replay and policy comparison
//! - [`config`]: Simulator configuration

pub mod config;
pub mod object;
pub mod snapshot;
pub mod policy;
pub mod cache;
pub mod trace;
pub mod simulator;
pub mod metrics;

pub use config::{ConfigError, SimulatorConfig, TraceFormat};
pub use object::{CacheObject, ObjectError};
pub use snapshot::{CacheSnapshot, StaticSnapshot};
pub use policy::{EvictionPolicy, PolicyError};
pub use policy::metadata::{InitialValues, KeyMetadata, MetadataStore};
pub use policy::scoring::{ScoreFormula, VictimOrder, Weights};
pub use policy::scored::{ScoredPolicy, ScoredPolicyConfig, UpdateRules};
pub use policy::presets::Preset;
pub use cache::{Cache, CacheError};
pub use trace::{Trace, TraceEntry, TraceError};
pub use simulator::{miss_ratio_reduction, to_jsonl, SimulationError, SimulationReport, Simulator};
pub use crate::metrics::LatencyTimer;
