// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the simulator.
//!
//! # Example
//!
//! ```
//! use scored_eviction::SimulatorConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SimulatorConfig::default();
//! assert_eq!(config.timeout_secs, 5);
//!
//! // Full config
//! let config = SimulatorConfig::from_json(r#"{
//!     "capacity": 1024,
//!     "consider_obj_size": true,
//!     "timeout_secs": 30,
//!     "trace": {"path": "traces/block.csv", "key_column": 1, "size_column": 2, "has_header": true}
//! }"#).unwrap();
//! assert_eq!(config.capacity, 1024);
//! assert_eq!(config.trace.unwrap().delimiter, ',');
//!
//! // Capacity as a share of the trace's distinct keys
//! let config = SimulatorConfig::from_json(r#"{"capacity_fraction": 0.1}"#).unwrap();
//! assert_eq!(config.resolve_capacity(1000), 100);
//! assert_eq!(config.resolve_capacity(3), 1);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cache capacity must be positive")]
    InvalidCapacity,
    #[error("Capacity fraction must be finite and positive, got {0}")]
    InvalidCapacityFraction(f64),
    #[error("Simulation timeout must be positive")]
    InvalidTimeout,
    #[error("Key and size columns must differ (both {0})")]
    ColumnClash(usize),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Simulation settings.
///
/// All fields have defaults; `capacity` is the one most callers set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Cache capacity in size units (objects, when sizes are ignored)
    #[serde(default = "default_capacity")]
    pub capacity: u64,

    /// Size the cache as this share of the trace's distinct keys instead,
    /// floored and never below 1
    #[serde(default)]
    pub capacity_fraction: Option<f64>,

    /// Count real object sizes against capacity instead of 1 per object
    #[serde(default)]
    pub consider_obj_size: bool,

    /// Wall-clock limit per simulation run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Trace to replay for [`Simulator::run_trace`](crate::Simulator::run_trace)
    #[serde(default)]
    pub trace: Option<TraceFormat>,
}

fn default_capacity() -> u64 { 1000 }
fn default_timeout_secs() -> u64 { 5 }

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            capacity_fraction: None,
            consider_obj_size: false,
            timeout_secs: default_timeout_secs(),
            trace: None,
        }
    }
}

impl SimulatorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        if let Some(fraction) = self.capacity_fraction {
            if !(fraction.is_finite() && fraction > 0.0) {
                return Err(ConfigError::InvalidCapacityFraction(fraction));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if let Some(trace) = &self.trace {
            if trace.size_column == Some(trace.key_column) {
                return Err(ConfigError::ColumnClash(trace.key_column));
            }
        }
        Ok(())
    }

    /// Cache capacity for a trace with `unique_keys` distinct keys.
    pub fn resolve_capacity(&self, unique_keys: usize) -> u64 {
        match self.capacity_fraction {
            Some(fraction) => ((unique_keys as f64 * fraction).floor() as u64).max(1),
            None => self.capacity,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Layout of a delimited trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFormat {
    #[serde(default)]
    pub path: PathBuf,

    /// 0-based column holding the key
    #[serde(default)]
    pub key_column: usize,

    /// 0-based column holding the object size, if any
    #[serde(default)]
    pub size_column: Option<usize>,

    /// Skip the first data line
    #[serde(default)]
    pub has_header: bool,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Lines starting with this character are skipped. Off by default,
    /// since keys may legitimately start with `#`.
    #[serde(default)]
    pub comment_prefix: Option<char>,
}

fn default_delimiter() -> char { ',' }

impl Default for TraceFormat {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            key_column: 0,
            size_column: None,
            has_header: false,
            delimiter: default_delimiter(),
            comment_prefix: None,
        }
    }
}

impl TraceFormat {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}
