//! Core types for scan results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while scanning.
///
/// Only configuration errors (`InvalidGlobPattern`, `InvalidKeyword`) are
/// surfaced to callers of a walk. The remaining variants describe why a
/// single file or directory was skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    SizeLimitExceeded { path: PathBuf, size: u64, limit: u64 },
    #[error("{path} looks like a binary file")]
    BinaryContentDetected { path: PathBuf },
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("invalid marker keyword {keyword:?}")]
    InvalidKeyword { keyword: String },
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only excludes one file or subtree from a walk.
    pub fn is_soft_skip(&self) -> bool {
        matches!(
            self,
            ScanError::Io { .. }
                | ScanError::SizeLimitExceeded { .. }
                | ScanError::BinaryContentDetected { .. }
        )
    }
}

/// A marker comment found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMarker {
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
    /// Line number (1-indexed)
    pub line_number: usize,
    /// Byte offset of the keyword in the raw line (1-indexed)
    pub column: usize,
    /// Upper-cased keyword, e.g. "TODO"
    pub marker_type: String,
    /// Parenthetical tag such as an author or ticket id, without parentheses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub content: String,
    pub discovered_at: DateTime<Utc>,
    /// Hex SHA-256 over path, line, type and content
    pub fingerprint: String,
}

impl ExtractedMarker {
    /// Key used by persistence layers to recognize an already stored marker.
    pub fn dedup_key(&self) -> (&str, &str, usize) {
        (&self.fingerprint, &self.relative_path, self.line_number)
    }

    /// Compare everything except `discovered_at`.
    pub fn same_identity(&self, other: &ExtractedMarker) -> bool {
        self.relative_path == other.relative_path
            && self.line_number == other.line_number
            && self.column == other.column
            && self.marker_type == other.marker_type
            && self.tag == other.tag
            && self.content == other.content
            && self.fingerprint == other.fingerprint
    }
}

/// Counters collected during a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub files_scanned: usize,
    /// Files skipped as unreadable, oversized or binary
    pub files_skipped: usize,
    pub markers_found: usize,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

/// Results of a full tree scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: String,
    pub markers: Vec<ExtractedMarker>,
    pub stats: ScanStats,
}

impl ScanReport {
    /// Number of markers per upper-cased type, sorted by type.
    pub fn counts_by_type(&self) -> Vec<(String, usize)> {
        let mut counts = std::collections::BTreeMap::new();
        for marker in &self.markers {
            *counts.entry(marker.marker_type.clone()).or_insert(0) += 1;
        }
        counts.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
