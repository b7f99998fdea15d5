//! todoscan - marker comment scanner.
//!
//! Walks a source tree, recognizes comment syntax per language and turns
//! every TODO, FIXME, HACK, BUG, NOTE or XXX comment into an
//! [`ExtractedMarker`] with a stable fingerprint. Storing, de-duplicating
//! and tracking markers over time is left to the caller.
//!
//! # Architecture
//!
//! - `scan`: the scanning engine (language registry, path filter, marker
//!   matcher, line scanner, fingerprint, tree walker)
//! - `config`: YAML-backed scan configuration
//! - `report`: output formatting (pretty, JSON)
//! - `cli`: command-line entry points
//!
//! # Adding a New Language
//!
//! Add a `LanguageGrammar` entry to the table in `src/scan/languages.rs`.
//! Entries earlier in the table win when extensions overlap.

pub mod cli;
pub mod config;
pub mod report;
pub mod scan;

pub use config::ScanConfig;
pub use scan::{
    fingerprint, scan_tree, walk, ExtractedMarker, FileScanner, LanguageGrammar, MarkerMatcher,
    MarkerWalk, PathFilter, ScanCancellation, ScanError, ScanReport, ScanStats,
};
