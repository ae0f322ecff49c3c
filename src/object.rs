// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cached object value.
//!
//! A [`CacheObject`] is the unit the simulated cache stores and the policy
//! hooks receive. It carries only what the eviction contract needs: a key and
//! a size.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    #[error("Object key must not be empty")]
    EmptyKey,
    #[error("Object '{key}' must have a positive size")]
    ZeroSize { key: String },
}

/// An object that can be admitted into the cache.
///
/// # Example
///
/// ```
/// use scored_eviction::CacheObject;
///
/// let obj = CacheObject::new("block-42", 4096, true).unwrap();
/// assert_eq!(obj.key(), "block-42");
/// assert_eq!(obj.size(), 4096);
///
/// // Sizes collapse to 1 when the simulation ignores object size
/// let unit = CacheObject::new("block-42", 4096, false).unwrap();
/// assert_eq!(unit.size(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheObject {
    key: String,
    size: u64,
}

impl CacheObject {
    /// Create an object, validating the key and size.
    ///
    /// With `consider_size == false` every object counts as one unit of
    /// capacity regardless of `size`.
    pub fn new(key: impl Into<String>, size: u64, consider_size: bool) -> Result<Self, ObjectError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ObjectError::EmptyKey);
        }
        if size == 0 {
            return Err(ObjectError::ZeroSize { key });
        }
        Ok(Self {
            key,
            size: if consider_size { size } else { 1 },
        })
    }

    /// Unit-sized object.
    pub fn unit(key: impl Into<String>) -> Result<Self, ObjectError> {
        Self::new(key, 1, false)
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }
}
