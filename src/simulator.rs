// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Trace-driven simulation.
//!
//! A [`Simulator`] replays a sequence of accesses through a fresh
//! [`Cache`] per run and reports the miss ratio. Runs are bounded by a
//! wall-clock limit so a pathological policy cannot stall a comparison.
//!
//! ```text
//! SimulatorConfig ─▶ Simulator ─┬─ run(policy, objects)  ─▶ SimulationReport
//!                               ├─ run_trace(policy)     ─▶ SimulationReport
//!                               └─ compare(configs, ..)  ─▶ Vec<SimulationReport>
//! ```

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{Cache, CacheError};
use crate::config::{ConfigError, SimulatorConfig};
use crate::metrics::{self, LatencyTimer};
use crate::object::{CacheObject, ObjectError};
use crate::policy::scored::{ScoredPolicy, ScoredPolicyConfig};
use crate::policy::{EvictionPolicy, PolicyError};
use crate::snapshot::CacheSnapshot;
use crate::trace::{Trace, TraceError};

/// Accesses between wall-clock checks.
const DEADLINE_CHECK_INTERVAL: usize = 1024;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Object(#[from] ObjectError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("No trace configured")]
    NoTrace,
    #[error("Trace contains no accesses")]
    EmptyTrace,
    #[error("Simulation exceeded {limit_secs}s after {processed} accesses")]
    Timeout { limit_secs: u64, processed: usize },
    #[error("Miss ratio reduction is undefined for a zero miss ratio")]
    ZeroMissRatio,
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub policy: String,
    pub capacity: u64,
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    /// `1 - hits / accesses`, rounded to 4 decimals
    pub miss_ratio: f64,
    pub elapsed_ms: u64,
}

impl SimulationReport {
    pub fn hit_ratio(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }

    /// Relative improvement over `baseline` (see [`miss_ratio_reduction`]).
    pub fn reduction_against(&self, baseline: &SimulationReport) -> Result<f64, SimulationError> {
        miss_ratio_reduction(self.miss_ratio, baseline.miss_ratio)
    }
}

/// Serialize reports as JSON lines.
pub fn to_jsonl(reports: &[SimulationReport]) -> Result<String, SimulationError> {
    let mut out = String::new();
    for report in reports {
        out.push_str(&serde_json::to_string(report)?);
        out.push('\n');
    }
    Ok(out)
}

/// Miss-ratio reduction of `mr` relative to `baseline_mr`.
///
/// Positive when `mr` is better. The denominator is the larger of the two,
/// so the value stays in `[-1, 1]`.
///
/// ```
/// use scored_eviction::miss_ratio_reduction;
///
/// assert_eq!(miss_ratio_reduction(0.25, 0.5).unwrap(), 0.5);
/// assert_eq!(miss_ratio_reduction(0.5, 0.25).unwrap(), -0.5);
/// assert!(miss_ratio_reduction(0.0, 0.5).is_err());
/// ```
pub fn miss_ratio_reduction(mr: f64, baseline_mr: f64) -> Result<f64, SimulationError> {
    if mr == 0.0 || baseline_mr == 0.0 {
        return Err(SimulationError::ZeroMissRatio);
    }
    let reduction = if mr > baseline_mr {
        (baseline_mr - mr) / mr
    } else {
        (baseline_mr - mr) / baseline_mr
    };
    Ok(reduction)
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Replays accesses through policies under a shared configuration.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    limit: Duration,
    total_elapsed: Duration,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            limit: config.timeout(),
            config,
            total_elapsed: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Wall-clock time spent across every run so far, failed runs included.
    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    fn load_trace(&self) -> Result<Trace, SimulationError> {
        let format = self.config.trace.as_ref().ok_or(SimulationError::NoTrace)?;
        Ok(Trace::load(format)?)
    }

    /// Load the configured trace as cache objects.
    pub fn load_objects(&self) -> Result<Vec<CacheObject>, SimulationError> {
        let trace = self.load_trace()?;
        Ok(trace.to_objects(self.config.consider_obj_size)?)
    }

    /// Replay `objects` through a fresh cache driven by `policy`.
    ///
    /// With `capacity_fraction` set, the cache is sized from the distinct
    /// keys in `objects`.
    pub fn run<P: EvictionPolicy>(
        &mut self,
        policy: P,
        objects: &[CacheObject],
    ) -> Result<SimulationReport, SimulationError> {
        let capacity = match self.config.capacity_fraction {
            Some(_) => {
                let distinct: HashSet<&str> = objects.iter().map(CacheObject::key).collect();
                self.config.resolve_capacity(distinct.len())
            }
            None => self.config.capacity,
        };
        self.run_with_capacity(policy, objects, capacity)
    }

    fn run_with_capacity<P: EvictionPolicy>(
        &mut self,
        policy: P,
        objects: &[CacheObject],
        capacity: u64,
    ) -> Result<SimulationReport, SimulationError> {
        if objects.is_empty() {
            return Err(SimulationError::EmptyTrace);
        }

        let name = policy.name().to_string();
        let timer = LatencyTimer::new(name.as_str());
        info!(policy = %name, capacity, accesses = objects.len(), "Simulation started");

        let mut cache = Cache::new(capacity, policy);
        let outcome = self.replay(&mut cache, objects);
        let elapsed = timer.elapsed();
        self.total_elapsed += elapsed;

        if let Err(e) = outcome {
            warn!(policy = %name, error = %e, "Simulation failed");
            return Err(e);
        }

        let miss_ratio = round4(1.0 - cache.hit_count() as f64 / cache.access_count() as f64);
        metrics::set_miss_ratio(&name, miss_ratio);
        info!(
            policy = %name,
            miss_ratio,
            elapsed_ms = elapsed.as_millis() as u64,
            "Simulation finished"
        );

        Ok(SimulationReport {
            policy: name,
            capacity,
            accesses: cache.access_count(),
            hits: cache.hit_count(),
            misses: cache.miss_count(),
            miss_ratio,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }

    fn replay<P: EvictionPolicy>(
        &self,
        cache: &mut Cache<P>,
        objects: &[CacheObject],
    ) -> Result<(), SimulationError> {
        let started = Instant::now();
        for (processed, obj) in objects.iter().enumerate() {
            if processed % DEADLINE_CHECK_INTERVAL == 0 && started.elapsed() >= self.limit {
                return Err(SimulationError::Timeout {
                    limit_secs: self.config.timeout_secs,
                    processed,
                });
            }
            cache.get(obj)?;
        }
        Ok(())
    }

    /// Load the configured trace and replay it.
    pub fn run_trace<P: EvictionPolicy>(&mut self, policy: P) -> Result<SimulationReport, SimulationError> {
        let trace = self.load_trace()?;
        let capacity = self.config.resolve_capacity(trace.unique_keys());
        let objects = trace.to_objects(self.config.consider_obj_size)?;
        self.run_with_capacity(policy, &objects, capacity)
    }

    /// Run each policy config on the same accesses, in input order.
    pub fn compare(
        &mut self,
        configs: &[ScoredPolicyConfig],
        objects: &[CacheObject],
    ) -> Result<Vec<SimulationReport>, SimulationError> {
        configs
            .iter()
            .map(|config| {
                let policy = ScoredPolicy::new(config.clone())?;
                self.run(policy, objects)
            })
            .collect()
    }
}
