//! Include/exclude filtering of scanned paths.
//!
//! Patterns use shell-glob semantics: `*` matches within a single path
//! segment, `?` matches one character and `[...]` a class. A `**` is not
//! recursive; it behaves like a single `*`, and braces are literal
//! characters rather than alternation.

use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

use super::ScanError;

/// A compiled pattern together with its source text.
#[derive(Debug, Clone)]
struct CompiledPattern {
    raw: String,
    matcher: GlobMatcher,
}

impl CompiledPattern {
    fn new(pattern: &str) -> Result<Self, ScanError> {
        let glob = GlobBuilder::new(&shell_glob(pattern))
            .literal_separator(true)
            .build()
            .map_err(|source| ScanError::InvalidGlobPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            raw: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }
}

/// Decides which files and directories take part in a scan.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<CompiledPattern>,
    exclude: Vec<CompiledPattern>,
}

impl PathFilter {
    /// Compile include and exclude patterns.
    ///
    /// Fails on the first malformed pattern.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, ScanError> {
        let include = include
            .iter()
            .map(|p| CompiledPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let exclude = exclude
            .iter()
            .map(|p| CompiledPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { include, exclude })
    }

    /// Check whether a path relative to the scan root is excluded.
    ///
    /// Hidden directories are always excluded; the scan root itself has an
    /// empty relative path and is never hidden.
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if is_dir && name.starts_with('.') {
            return true;
        }

        let path_str = normalize(relative);
        self.exclude
            .iter()
            .any(|p| p.raw == name || p.matcher.is_match(&path_str))
    }

    /// Check whether a file matches the include patterns.
    ///
    /// With no include patterns configured every file is included.
    pub fn is_included(&self, relative: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let path_str = normalize(relative);
        self.include.iter().any(|p| p.matcher.is_match(&path_str))
    }

    /// Combined decision for a file: excludes win over includes.
    pub fn accepts_file(&self, relative: &Path) -> bool {
        !self.is_excluded(relative, false) && self.is_included(relative)
    }
}

/// Render a relative path with `/` separators.
pub(crate) fn normalize(relative: &Path) -> String {
    let s = relative.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Rewrite a shell pattern into globset syntax.
///
/// Runs of `*` collapse to a single `*` so `**` never crosses segments, and
/// `{`/`}` outside a class become single-character classes.
fn shell_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    let mut prev_star = false;
    let mut in_class = false;
    while let Some(ch) = chars.next() {
        if ch == '*' && prev_star && !in_class {
            continue;
        }
        prev_star = ch == '*' && !in_class;
        match ch {
            '\\' => {
                out.push(ch);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(ch);
            }
            ']' if in_class => {
                in_class = false;
                out.push(ch);
            }
            '{' | '}' if !in_class => {
                out.push('[');
                out.push(ch);
                out.push(']');
            }
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str]) -> PathFilter {
        PathFilter::new(include, exclude).unwrap()
    }

    #[test]
    fn test_hidden_directories_always_excluded() {
        let f = filter(&[], &[]);
        assert!(f.is_excluded(Path::new(".git"), true));
        assert!(f.is_excluded(Path::new("src/.cache"), true));
        assert!(!f.is_excluded(Path::new(""), true));
        // Hidden files are not covered by the directory rule
        assert!(!f.is_excluded(Path::new(".env.example"), false));
    }

    #[test]
    fn test_exclude_by_base_name() {
        let f = filter(&[], &["node_modules", "vendor"]);
        assert!(f.is_excluded(Path::new("node_modules"), true));
        assert!(f.is_excluded(Path::new("deep/node_modules"), true));
        assert!(f.is_excluded(Path::new("pkg/vendor"), true));
        assert!(!f.is_excluded(Path::new("src"), true));
    }

    #[test]
    fn test_exclude_by_glob() {
        let f = filter(&[], &["*.min.js", "gen/*.go"]);
        assert!(f.is_excluded(Path::new("app.min.js"), false));
        assert!(f.is_excluded(Path::new("gen/types.go"), false));
        // `*` stays within one segment
        assert!(!f.is_excluded(Path::new("web/app.min.js"), false));
        assert!(!f.is_excluded(Path::new("gen/sub/types.go"), false));
    }

    #[test]
    fn test_double_star_is_not_recursive() {
        let f = filter(&[], &["src/**/*.rs"]);
        assert!(!f.is_excluded(Path::new("src/a/b/lib.rs"), false));
        assert!(f.is_excluded(Path::new("src/a/lib.rs"), false));
    }

    #[test]
    fn test_include_patterns() {
        let f = filter(&["*.go", "cmd/*.go"], &[]);
        assert!(f.is_included(Path::new("main.go")));
        assert!(f.is_included(Path::new("cmd/root.go")));
        assert!(!f.is_included(Path::new("README.md")));
        assert!(!f.is_included(Path::new("internal/parser/parser.go")));
    }

    #[test]
    fn test_no_include_patterns_includes_everything() {
        let f = filter(&[], &[]);
        assert!(f.is_included(Path::new("anything/at/all.txt")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let f = filter(&["*.go"], &["main.go"]);
        assert!(!f.accepts_file(Path::new("main.go")));
        assert!(f.accepts_file(Path::new("util.go")));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = PathFilter::new(&[] as &[&str], &["src/[abc"]).unwrap_err();
        match err {
            ScanError::InvalidGlobPattern { pattern, .. } => assert_eq!(pattern, "src/[abc"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_shell_glob() {
        assert_eq!(shell_glob("**/*.rs"), "*/*.rs");
        assert_eq!(shell_glob("a***b"), "a*b");
        assert_eq!(shell_glob("plain"), "plain");
        assert_eq!(shell_glob("{a,b}.go"), "[{]a,b[}].go");
        assert_eq!(shell_glob("[{}]x"), "[{}]x");
    }

    #[test]
    fn test_braces_are_literal() {
        let f = filter(&[], &["{a,b}.go"]);
        assert!(!f.is_excluded(Path::new("a.go"), false));
        assert!(!f.is_excluded(Path::new("b.go"), false));
        assert!(f.is_excluded(Path::new("{a,b}.go"), false));

        let f = filter(&["tmpl/{name}.*"], &[]);
        assert!(f.is_included(Path::new("tmpl/{name}.html")));
        assert!(!f.is_included(Path::new("tmpl/name.html")));
    }
}
