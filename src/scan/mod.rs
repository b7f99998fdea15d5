//! Marker comment scanning engine.
//!
//! Data flows one way: the walker selects files, the line scanner finds
//! comment payloads, the matcher recognizes marker keywords in them and
//! the fingerprint identifies each resulting record.

mod cancellation;
mod filter;
mod hasher;
pub mod languages;
mod matcher;
mod scanner;
mod types;
mod walker;

pub use cancellation::ScanCancellation;
pub use filter::PathFilter;
pub use hasher::fingerprint;
pub use languages::LanguageGrammar;
pub use matcher::{MarkerMatch, MarkerMatcher, DEFAULT_KEYWORDS};
pub use scanner::{ClassifiedLine, CommentState, FileScanner, LineKind, LineScanner, MAX_FILE_SIZE};
pub use types::{ExtractedMarker, ScanError, ScanReport, ScanStats};
pub use walker::{scan_tree, walk, EligibleFile, FileWalk, MarkerWalk};
