//! Directory traversal.
//!
//! Two entry points share the same traversal rules:
//! - `walk`: a lazy, sequential iterator over markers
//! - `scan_tree`: a parallel scan on a bounded worker pool

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;

use super::filter::normalize;
use super::{ExtractedMarker, FileScanner, PathFilter, ScanCancellation, ScanError, ScanReport, ScanStats};

type EntryIter = Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>;

/// A file selected for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
}

/// Depth-first iterator over the files a scan should read.
///
/// Entries are visited in file-name order. Hidden and excluded directories
/// are pruned without being entered.
pub struct FileWalk {
    root: PathBuf,
    entries: EntryIter,
    filter: Arc<PathFilter>,
    /// Entries that could not be read
    errors: usize,
}

impl FileWalk {
    pub fn new(root: &Path, filter: PathFilter, follow_links: bool) -> Self {
        let root = root.to_path_buf();
        let filter = Arc::new(filter);

        let prune_root = root.clone();
        let prune_filter = Arc::clone(&filter);
        let entries = WalkDir::new(&root)
            .follow_links(follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    // A root directory is never pruned, a root file is still filtered
                    return entry.file_type().is_dir()
                        || !prune_filter.is_excluded(Path::new(entry.file_name()), false);
                }
                let relative = entry.path().strip_prefix(&prune_root).unwrap_or(entry.path());
                !prune_filter.is_excluded(relative, entry.file_type().is_dir())
            });

        Self {
            root,
            entries: Box::new(entries),
            filter,
            errors: 0,
        }
    }

    /// Number of unreadable entries seen so far.
    pub fn errors(&self) -> usize {
        self.errors
    }

    fn relative_path(&self, entry: &DirEntry) -> String {
        if entry.depth() == 0 {
            return entry.file_name().to_string_lossy().into_owned();
        }
        let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
        normalize(relative)
    }
}

impl Iterator for FileWalk {
    type Item = EligibleFile;

    fn next(&mut self) -> Option<EligibleFile> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    self.errors += 1;
                    continue;
                }
            };
            if !is_regular_file(&entry) {
                continue;
            }
            let relative_path = self.relative_path(&entry);
            if !self.filter.is_included(Path::new(&relative_path)) {
                continue;
            }
            return Some(EligibleFile {
                path: entry.into_path(),
                relative_path,
            });
        }
    }
}

/// Regular files, including symlinks to regular files when links are not
/// followed. Symlinked directories are never entered in that mode.
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Lazy, sequential marker iterator returned by [`walk`].
pub struct MarkerWalk {
    files: FileWalk,
    scanner: FileScanner,
    pending: std::vec::IntoIter<ExtractedMarker>,
    cancellation: Option<ScanCancellation>,
    stats: ScanStats,
    started: Instant,
}

impl MarkerWalk {
    /// Stop between files once `cancellation` is triggered.
    pub fn with_cancellation(mut self, cancellation: ScanCancellation) -> Self {
        self.cancellation = Some(cancellation);
        self
    }

    /// Counters for the files visited so far.
    pub fn stats(&self) -> ScanStats {
        let mut stats = self.stats.clone();
        stats.files_skipped += self.files.errors();
        stats.elapsed = self.started.elapsed();
        stats
    }

    /// Drain the walk into a report.
    pub fn into_report(mut self, root: &Path) -> ScanReport {
        let markers: Vec<ExtractedMarker> = self.by_ref().collect();
        ScanReport {
            root: root.display().to_string(),
            markers,
            stats: self.stats(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(|c| c.is_cancelled())
            .unwrap_or(false)
    }
}

impl Iterator for MarkerWalk {
    type Item = ExtractedMarker;

    fn next(&mut self) -> Option<ExtractedMarker> {
        loop {
            if let Some(marker) = self.pending.next() {
                return Some(marker);
            }
            let file = self.files.next()?;
            if self.is_cancelled() {
                self.stats.cancelled = true;
                return None;
            }

            match self.scanner.scan_file(&file.path, &file.relative_path) {
                Ok(markers) => {
                    self.stats.files_scanned += 1;
                    self.stats.markers_found += markers.len();
                    self.pending = markers.into_iter();
                }
                Err(err) => {
                    debug!(path = %file.relative_path, error = %err, "skipping file");
                    self.stats.files_skipped += 1;
                }
            }
        }
    }
}

/// Walk `root` and lazily yield every marker found.
///
/// Configuration is validated up front; after that, unreadable, binary
/// and oversized files are skipped and the walk carries on. Each call reads
/// the tree from disk again.
pub fn walk(root: &Path, config: &ScanConfig) -> Result<MarkerWalk, ScanError> {
    let filter = config.path_filter()?;
    let scanner = config.file_scanner()?;
    Ok(MarkerWalk {
        files: FileWalk::new(root, filter, config.follow_links),
        scanner,
        pending: Vec::new().into_iter(),
        cancellation: None,
        stats: ScanStats::default(),
        started: Instant::now(),
    })
}

/// Scan `root` in parallel on `config.parallel_workers` threads.
///
/// Markers are sorted by path, line and column so the result does not
/// depend on scheduling.
pub fn scan_tree(
    root: &Path,
    config: &ScanConfig,
    cancellation: &ScanCancellation,
) -> Result<ScanReport, ScanError> {
    let started = Instant::now();
    let filter = config.path_filter()?;
    let scanner = config.file_scanner()?;

    let mut files = FileWalk::new(root, filter, config.follow_links);
    let eligible: Vec<EligibleFile> = files.by_ref().collect();
    let walk_errors = files.errors();

    let scanned = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(walk_errors);
    let interrupted = AtomicBool::new(false);

    let run = || -> Vec<ExtractedMarker> {
        eligible
            .par_iter()
            .filter_map(|file| {
                if cancellation.is_cancelled() {
                    interrupted.store(true, Ordering::Relaxed);
                    return None;
                }
                match scanner.scan_file(&file.path, &file.relative_path) {
                    Ok(markers) => {
                        scanned.fetch_add(1, Ordering::Relaxed);
                        Some(markers)
                    }
                    Err(err) => {
                        debug!(path = %file.relative_path, error = %err, "skipping file");
                        skipped.fetch_add(1, Ordering::Relaxed);
                        None
                    }
                }
            })
            .flatten()
            .collect()
    };

    let mut markers = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers())
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!(error = %err, "could not build worker pool, using the global pool");
            run()
        }
    };

    markers.sort_by(|a, b| {
        (&a.relative_path, a.line_number, a.column).cmp(&(&b.relative_path, b.line_number, b.column))
    });

    let stats = ScanStats {
        files_scanned: scanned.into_inner(),
        files_skipped: skipped.into_inner(),
        markers_found: markers.len(),
        cancelled: interrupted.into_inner(),
        elapsed: started.elapsed(),
    };
    info!(
        files = stats.files_scanned,
        skipped = stats.files_skipped,
        markers = stats.markers_found,
        "scan finished"
    );

    Ok(ScanReport {
        root: root.display().to_string(),
        markers,
        stats,
    })
}
