//! Marker keyword recognition inside comment text.
//!
//! Recognized shapes:
//! - `TODO: fix this`
//! - `FIXME(alice): handle nil`
//! - `HACK - temporary workaround`
//! - `NOTE remember the cache`

use lazy_static::lazy_static;
use regex::Regex;

use super::ScanError;

/// Keywords scanned for when none are configured.
pub const DEFAULT_KEYWORDS: &[&str] = &["TODO", "FIXME", "HACK", "BUG", "NOTE", "XXX"];

lazy_static! {
    static ref DEFAULT_MATCHER: MarkerMatcher =
        MarkerMatcher::new(DEFAULT_KEYWORDS).expect("default keywords are valid");
}

/// A keyword hit within a piece of comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    /// Upper-cased keyword
    pub marker_type: String,
    pub tag: Option<String>,
    pub content: String,
    /// Byte offset of the keyword within the matched text
    pub offset: usize,
}

/// Matches marker keywords against comment payloads.
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    pattern: Regex,
    keywords: Vec<String>,
}

impl MarkerMatcher {
    /// Build a matcher for the given keywords.
    ///
    /// Keywords are matched case-insensitively as whole words. Each keyword
    /// must be non-empty and made of word characters.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Result<Self, ScanError> {
        let mut upper: Vec<String> = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let kw = kw.as_ref().trim();
            if kw.is_empty() || !kw.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ScanError::InvalidKeyword {
                    keyword: kw.to_string(),
                });
            }
            let kw = kw.to_uppercase();
            if !upper.contains(&kw) {
                upper.push(kw);
            }
        }
        if upper.is_empty() {
            return Err(ScanError::InvalidKeyword {
                keyword: String::new(),
            });
        }

        let alternation = upper
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let source = format!(
            r"(?i)\b({})\b[ \t]*(?:\(([^)]+)\))?[ \t]*[:\-]?[ \t]*(.*)$",
            alternation
        );
        let pattern = Regex::new(&source).map_err(|_| ScanError::InvalidKeyword {
            keyword: upper.join(","),
        })?;

        Ok(Self {
            pattern,
            keywords: upper,
        })
    }

    /// Matcher for the default keyword set.
    pub fn default_matcher() -> &'static MarkerMatcher {
        &DEFAULT_MATCHER
    }

    /// Upper-cased keywords this matcher recognizes.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Find the leftmost marker in `text`.
    pub fn find(&self, text: &str) -> Option<MarkerMatch> {
        let caps = self.pattern.captures(text)?;
        let keyword = caps.get(1)?;
        let tag = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());
        let content = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        Some(MarkerMatch {
            marker_type: keyword.as_str().to_uppercase(),
            tag,
            content,
            offset: keyword.start(),
        })
    }
}

impl Default for MarkerMatcher {
    fn default() -> Self {
        DEFAULT_MATCHER.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str) -> Option<MarkerMatch> {
        MarkerMatcher::default_matcher().find(text)
    }

    #[test]
    fn test_basic_markers() {
        let cases = [
            ("TODO: fix this bug", "TODO", "fix this bug"),
            ("FIXME: this is broken", "FIXME", "this is broken"),
            ("HACK: workaround here", "HACK", "workaround here"),
            ("NOTE: remember this", "NOTE", "remember this"),
            ("XXX: remove later", "XXX", "remove later"),
            ("BUG - off by one", "BUG", "off by one"),
            ("TODO implement retries", "TODO", "implement retries"),
        ];
        for (text, kind, content) in cases {
            let m = find(text).unwrap_or_else(|| panic!("no match for {:?}", text));
            assert_eq!(m.marker_type, kind);
            assert_eq!(m.content, content);
        }
    }

    #[test]
    fn test_tag_is_captured_separately() {
        let m = find("FIXME(alice): handle nil").unwrap();
        assert_eq!(m.marker_type, "FIXME");
        assert_eq!(m.tag.as_deref(), Some("alice"));
        assert_eq!(m.content, "handle nil");

        let m = find("BUG(JIRA-123) - critical issue").unwrap();
        assert_eq!(m.tag.as_deref(), Some("JIRA-123"));
        assert_eq!(m.content, "critical issue");
    }

    #[test]
    fn test_keyword_case_insensitive_and_upper_cased() {
        let m = find("todo: lowercase should match").unwrap();
        assert_eq!(m.marker_type, "TODO");
        assert_eq!(m.content, "lowercase should match");
    }

    #[test]
    fn test_whole_word_only() {
        assert!(find("TODOS are tracked elsewhere").is_none());
        assert!(find("call mytodo() first").is_none());
        assert!(find("NOTEBOOK entries").is_none());
    }

    #[test]
    fn test_no_match() {
        assert!(find("not a marker").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn test_empty_content() {
        let m = find("FIXME").unwrap();
        assert_eq!(m.content, "");
        assert!(m.tag.is_none());
    }

    #[test]
    fn test_offset_points_at_keyword() {
        let m = find("  see below. TODO: x").unwrap();
        assert_eq!(m.offset, 13);
    }

    #[test]
    fn test_custom_keywords() {
        let matcher = MarkerMatcher::new(&["optimize", "TODO", "todo"]).unwrap();
        assert_eq!(matcher.keywords(), &["OPTIMIZE".to_string(), "TODO".to_string()]);
        let m = matcher.find("Optimize: batch inserts").unwrap();
        assert_eq!(m.marker_type, "OPTIMIZE");
        assert!(matcher.find("FIXME: not configured").is_none());
    }

    #[test]
    fn test_invalid_keywords() {
        assert!(MarkerMatcher::new(&[""]).is_err());
        assert!(MarkerMatcher::new(&["TO DO"]).is_err());
        assert!(MarkerMatcher::new::<&str>(&[]).is_err());
    }
}
