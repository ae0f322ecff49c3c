// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Access trace loading.
//!
//! # Format
//!
//! Delimited text, one access per line. The key column is required, the size
//! column is optional (every access counts as size 1 without it):
//!
//! ```text
//! timestamp,key,size
//! 0,block-7,4096
//! 1,block-3,512
//! 2,block-7,4096
//! ```
//!
//! Blank lines are skipped, and so are comment lines when
//! [`TraceFormat::comment_prefix`] is set. Line numbers in errors are
//! 1-based and count every physical line.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::config::TraceFormat;
use crate::object::{CacheObject, ObjectError};

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Line {line}: missing column {column}")]
    MissingColumn { line: usize, column: usize },
    #[error("Line {line}: invalid size '{value}'")]
    InvalidSize { line: usize, value: String },
    #[error("Line {line}: {source}")]
    Object {
        line: usize,
        #[source]
        source: ObjectError,
    },
}

/// One access read from a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// 1-based source line
    pub line: usize,
    pub key: String,
    pub size: u64,
}

/// A parsed access trace.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    pub entries: Vec<TraceEntry>,
}

impl Trace {
    /// Load the trace described by `format`.
    pub fn load(format: &TraceFormat) -> Result<Self, TraceError> {
        let file = File::open(&format.path).map_err(|source| TraceError::Io {
            path: format.path.clone(),
            source,
        })?;
        let trace = Self::from_reader(BufReader::new(file), format)?;

        debug!(path = %format.path.display(), entries = trace.len(), "Trace loaded");
        Ok(trace)
    }

    /// Parse a trace from any buffered reader. `format.path` is only used
    /// in error messages.
    pub fn from_reader<R: BufRead>(reader: R, format: &TraceFormat) -> Result<Self, TraceError> {
        let mut entries = Vec::new();
        let mut header_pending = format.has_header;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|source| TraceError::Io {
                path: format.path.clone(),
                source,
            })?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if format.comment_prefix.is_some_and(|prefix| line.starts_with(prefix)) {
                continue;
            }
            if header_pending {
                header_pending = false;
                continue;
            }

            entries.push(parse_line(line, line_no, format)?);
        }

        Ok(Self { entries })
    }

    /// Parse a trace held in memory.
    pub fn parse(text: &str, format: &TraceFormat) -> Result<Self, TraceError> {
        Self::from_reader(text.as_bytes(), format)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    pub fn unique_keys(&self) -> usize {
        let mut keys: Vec<&str> = self.entries.iter().map(|e| e.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// Convert every entry to a [`CacheObject`].
    pub fn to_objects(&self, consider_size: bool) -> Result<Vec<CacheObject>, TraceError> {
        self.entries
            .iter()
            .map(|entry| {
                CacheObject::new(entry.key.as_str(), entry.size, consider_size).map_err(|source| {
                    TraceError::Object {
                        line: entry.line,
                        source,
                    }
                })
            })
            .collect()
    }
}

fn parse_line(line: &str, line_no: usize, format: &TraceFormat) -> Result<TraceEntry, TraceError> {
    let columns: Vec<&str> = line.split(format.delimiter).map(str::trim).collect();

    let column = |index: usize| {
        columns.get(index).copied().ok_or(TraceError::MissingColumn {
            line: line_no,
            column: index,
        })
    };

    let key = column(format.key_column)?.to_string();
    let size = match format.size_column {
        Some(index) => {
            let raw = column(index)?;
            raw.parse::<u64>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| TraceError::InvalidSize {
                    line: line_no,
                    value: raw.to_string(),
                })?
        }
        None => 1,
    };

    Ok(TraceEntry {
        line: line_no,
        key,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn format() -> TraceFormat {
        TraceFormat {
            key_column: 1,
            size_column: Some(2),
            has_header: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_with_header_and_sizes() {
        let text = "ts,key,size\n0,a,10\n1,b,20\n\n# comment\n2,a,10\n";
        let format = TraceFormat {
            comment_prefix: Some('#'),
            ..format()
        };
        let trace = Trace::parse(text, &format).unwrap();

        assert_eq!(trace.len(), 3);
        assert_eq!(trace.unique_keys(), 2);
        assert_eq!(
            trace.entries[2],
            TraceEntry { line: 6, key: "a".into(), size: 10 }
        );
    }

    #[test]
    fn test_hash_keys_kept_without_comment_prefix() {
        let trace = Trace::parse("#a\nb\n#a\n", &TraceFormat::default()).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.entries[0].key, "#a");
        assert_eq!(trace.unique_keys(), 2);
    }

    #[test]
    fn test_key_only_trace() {
        let format = TraceFormat::default();
        let trace = Trace::parse("x\ny\nx\n", &format).unwrap();
        assert!(trace.entries.iter().all(|e| e.size == 1));
        assert_eq!(trace.entries[1].key, "y");
    }

    #[test]
    fn test_missing_column_reports_line() {
        let err = Trace::parse("ts,key,size\n0,a,1\n1,b\n", &format()).unwrap_err();
        assert!(matches!(err, TraceError::MissingColumn { line: 3, column: 2 }));
    }

    #[test]
    fn test_invalid_size() {
        let err = Trace::parse("h\n0,a,big\n", &format()).unwrap_err();
        assert!(matches!(err, TraceError::InvalidSize { line: 2, .. }));

        let err = Trace::parse("h\n0,a,0\n", &format()).unwrap_err();
        assert!(matches!(err, TraceError::InvalidSize { line: 2, .. }));
    }

    #[test]
    fn test_empty_key_fails_on_conversion() {
        let trace = Trace::parse("h\n0,,5\n", &format()).unwrap();
        let err = trace.to_objects(true).unwrap_err();
        assert!(matches!(
            err,
            TraceError::Object { line: 2, source: ObjectError::EmptyKey }
        ));
    }

    #[test]
    fn test_to_objects_respects_consider_size() {
        let trace = Trace::parse("h\n0,a,10\n1,b,20\n", &format()).unwrap();
        let sized: Vec<u64> = trace.to_objects(true).unwrap().iter().map(|o| o.size()).collect();
        let unit: Vec<u64> = trace.to_objects(false).unwrap().iter().map(|o| o.size()).collect();
        assert_eq!(sized, vec![10, 20]);
        assert_eq!(unit, vec![1, 1]);
    }

    #[test]
    fn test_custom_delimiter() {
        let format = TraceFormat {
            delimiter: ' ',
            key_column: 0,
            size_column: Some(1),
            ..Default::default()
        };
        let trace = Trace::parse("a 3\nb 4\n", &format).unwrap();
        assert_eq!(trace.entries[1].size, 4);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "ts,key,size").unwrap();
        writeln!(file, "0,a,1").unwrap();
        writeln!(file, "1,b,2").unwrap();

        let format = TraceFormat { path, ..format() };
        let trace = Trace::load(&format).unwrap();
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let format = TraceFormat {
            path: PathBuf::from("/nonexistent/trace.csv"),
            ..format()
        };
        assert!(matches!(Trace::load(&format), Err(TraceError::Io { .. })));
    }
}
