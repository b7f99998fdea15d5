//! Per-file comment scanning.
//!
//! Each file is read line by line through a small state machine that
//! knows whether the current line is inside a multi-line comment. The
//! state starts over for every file.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fs;
use std::io::Read;
use std::path::Path;

use super::hasher::fingerprint;
use super::languages::{self, LanguageGrammar};
use super::matcher::{MarkerMatch, MarkerMatcher};
use super::{ExtractedMarker, ScanError};

/// Files larger than this are skipped.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Where the scanner is between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentState {
    Normal,
    /// Inside the multi-line comment opened by the grammar's pair at `pair`
    InMultiLine { pair: usize },
}

/// How a single line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Code,
    SingleLine,
    /// Opens a multi-line comment and closes it again on the same line
    BlockInline,
    BlockStart,
    BlockContinuation,
    BlockEnd,
}

/// Classification of one line plus the byte range of its comment payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    /// Byte range within the raw line, empty for code lines
    pub payload: (usize, usize),
}

impl ClassifiedLine {
    fn code() -> Self {
        Self {
            kind: LineKind::Code,
            payload: (0, 0),
        }
    }

    fn comment(kind: LineKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            payload: (start, end),
        }
    }
}

/// Line-by-line comment state machine for one file.
#[derive(Debug)]
pub struct LineScanner<'a> {
    grammar: Option<&'static LanguageGrammar>,
    matcher: &'a MarkerMatcher,
    state: CommentState,
}

impl<'a> LineScanner<'a> {
    /// Start scanning a file. `None` selects the unknown-language fallback,
    /// where any line starting with `#` is treated as a comment.
    pub fn new(grammar: Option<&'static LanguageGrammar>, matcher: &'a MarkerMatcher) -> Self {
        Self {
            grammar,
            matcher,
            state: CommentState::Normal,
        }
    }

    pub fn state(&self) -> CommentState {
        self.state
    }

    /// Classify a line and advance the comment state.
    pub fn classify(&mut self, line: &str) -> ClassifiedLine {
        let Some(grammar) = self.grammar else {
            return classify_unknown(line);
        };

        if let CommentState::InMultiLine { pair } = self.state {
            let (_, end) = grammar.multi_line_delimiters[pair];
            return match line.find(end) {
                Some(idx) => {
                    self.state = CommentState::Normal;
                    ClassifiedLine::comment(LineKind::BlockEnd, 0, idx)
                }
                None => ClassifiedLine::comment(LineKind::BlockContinuation, 0, line.len()),
            };
        }

        let trimmed = line.trim_start();
        let lead = line.len() - trimmed.len();
        for prefix in grammar.single_line_prefixes {
            if trimmed.starts_with(prefix) {
                return ClassifiedLine::comment(LineKind::SingleLine, lead + prefix.len(), line.len());
            }
        }

        for (idx, (start, end)) in grammar.multi_line_delimiters.iter().enumerate() {
            let Some(open) = line.find(start) else {
                continue;
            };
            let body = open + start.len();
            return match line[body..].find(end) {
                Some(close) => ClassifiedLine::comment(LineKind::BlockInline, body, body + close),
                None => {
                    self.state = CommentState::InMultiLine { pair: idx };
                    ClassifiedLine::comment(LineKind::BlockStart, body, line.len())
                }
            };
        }

        ClassifiedLine::code()
    }

    /// Classify a line and look for a marker in its comment payload.
    ///
    /// The returned offset is relative to the raw line.
    pub fn scan_line(&mut self, line: &str) -> Option<MarkerMatch> {
        let classified = self.classify(line);
        if classified.kind == LineKind::Code {
            return None;
        }
        let (start, end) = classified.payload;
        let mut found = self.matcher.find(&line[start..end])?;
        found.offset += start;
        Some(found)
    }
}

fn classify_unknown(line: &str) -> ClassifiedLine {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        let lead = line.len() - trimmed.len();
        ClassifiedLine::comment(LineKind::SingleLine, lead + 1, line.len())
    } else {
        ClassifiedLine::code()
    }
}

/// Scans files and in-memory sources for markers.
#[derive(Debug, Clone)]
pub struct FileScanner {
    matcher: MarkerMatcher,
    max_file_size: u64,
}

impl FileScanner {
    pub fn new(matcher: MarkerMatcher) -> Self {
        Self {
            matcher,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Override the size limit.
    pub fn max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    pub fn matcher(&self) -> &MarkerMatcher {
        &self.matcher
    }

    /// Scan a file on disk.
    ///
    /// Oversized files and files whose first line contains a NUL byte are
    /// rejected with `SizeLimitExceeded` and `BinaryContentDetected`.
    pub fn scan_file(&self, path: &Path, relative_path: &str) -> Result<Vec<ExtractedMarker>, ScanError> {
        let mut file = fs::File::open(path).map_err(|e| ScanError::io(path, e))?;
        let size = file.metadata().map_err(|e| ScanError::io(path, e))?.len();
        if size > self.max_file_size {
            return Err(ScanError::SizeLimitExceeded {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }

        let mut bytes = Vec::with_capacity(size as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| ScanError::io(path, e))?;

        let first_line_end = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
        if bytes[..first_line_end].contains(&0) {
            return Err(ScanError::BinaryContentDetected {
                path: path.to_path_buf(),
            });
        }

        let first_line = String::from_utf8_lossy(&bytes[..first_line_end]);
        let grammar = languages::detect(path, first_line.trim_end_matches('\r'));
        Ok(self.scan_bytes(relative_path, grammar, &bytes))
    }

    /// Scan source text that is already in memory.
    pub fn scan_source(
        &self,
        relative_path: &str,
        grammar: Option<&'static LanguageGrammar>,
        text: &str,
    ) -> Vec<ExtractedMarker> {
        self.scan_bytes(relative_path, grammar, text.as_bytes())
    }

    /// Lines that are not valid UTF-8 are decoded lossily for matching, but
    /// columns always refer to the raw bytes.
    fn scan_bytes(
        &self,
        relative_path: &str,
        grammar: Option<&'static LanguageGrammar>,
        bytes: &[u8],
    ) -> Vec<ExtractedMarker> {
        let discovered_at = Utc::now();
        let mut scanner = LineScanner::new(grammar, &self.matcher);
        let mut markers = Vec::new();

        for (idx, raw) in bytes.split(|&b| b == b'\n').enumerate() {
            let raw = raw.strip_suffix(&b"\r"[..]).unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if let Some(mut found) = scanner.scan_line(&line) {
                if let Cow::Owned(_) = line {
                    found.offset = raw_offset(raw, found.offset);
                }
                markers.push(build_marker(relative_path, idx + 1, found, discovered_at));
            }
        }

        markers
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new(MarkerMatcher::default())
    }
}

/// Map a byte offset in the lossy decoding of `raw` back into `raw`.
///
/// Every invalid sequence decodes to one U+FFFD.
fn raw_offset(raw: &[u8], decoded: usize) -> usize {
    let mut raw_pos = 0;
    let mut decoded_pos = 0;
    while raw_pos < raw.len() && decoded_pos < decoded {
        let remaining = decoded - decoded_pos;
        let valid = match std::str::from_utf8(&raw[raw_pos..]) {
            Ok(_) => return raw_pos + remaining,
            Err(err) => err,
        };
        if remaining <= valid.valid_up_to() {
            return raw_pos + remaining;
        }
        raw_pos += valid.valid_up_to();
        decoded_pos += valid.valid_up_to();

        let invalid = valid.error_len().unwrap_or(raw.len() - raw_pos);
        raw_pos += invalid;
        decoded_pos += char::REPLACEMENT_CHARACTER.len_utf8();
    }
    raw_pos
}

fn build_marker(
    relative_path: &str,
    line_number: usize,
    found: MarkerMatch,
    discovered_at: DateTime<Utc>,
) -> ExtractedMarker {
    let fingerprint = fingerprint(relative_path, line_number, &found.marker_type, &found.content);
    ExtractedMarker {
        relative_path: relative_path.to_string(),
        line_number,
        column: found.offset + 1,
        marker_type: found.marker_type,
        tag: found.tag,
        content: found.content,
        discovered_at,
        fingerprint,
    }
}
