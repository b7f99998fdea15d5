//! Scan configuration.
//!
//! A config file is optional. When present it is YAML:
//!
//! ```yaml
//! exclude: [".git", "node_modules", "vendor"]
//! include: ["*.go", "cmd/*.go"]
//! keywords: [TODO, FIXME, HACK, BUG, NOTE, XXX]
//! parallel_workers: 4
//! ```

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scan::{FileScanner, MarkerMatcher, PathFilter, ScanError, DEFAULT_KEYWORDS, MAX_FILE_SIZE};

/// Config file names searched for in the working directory.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["todoscan.yaml", ".todoscan.yaml"];

/// Directories skipped unless the config says otherwise.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "build",
    ".next",
    "__pycache__",
    ".cache",
    "coverage",
];

/// Settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns a file must match (any) to be scanned; empty means all
    #[serde(rename = "include")]
    pub include_patterns: Vec<String>,
    /// Base names or glob patterns to skip
    #[serde(rename = "exclude")]
    pub exclude_patterns: Vec<String>,
    /// Marker keywords; empty falls back to the defaults
    #[serde(rename = "keywords")]
    pub marker_keywords: Vec<String>,
    pub follow_links: bool,
    /// Worker threads for parallel scans
    pub parallel_workers: usize,
    /// Files above this many bytes are skipped
    pub max_file_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            marker_keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            follow_links: false,
            parallel_workers: 4,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

impl ScanConfig {
    /// Config with no exclude patterns at all.
    pub fn unfiltered() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            ..Self::default()
        }
    }

    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parse a config from YAML text. Missing fields take their defaults.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ScanConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Find a config file: the working directory first, then the user
    /// config directory (`~/.config/todoscan/config.yaml` on Linux).
    pub fn discover(cwd: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| cwd.join(name))
            .chain(user_config_path())
            .find(|p| p.is_file())
    }

    /// Replace patterns and keywords with any non-empty overrides.
    pub fn with_overrides(
        mut self,
        include: &[String],
        exclude: &[String],
        keywords: &[String],
    ) -> Self {
        if !include.is_empty() {
            self.include_patterns = include.to_vec();
        }
        if !exclude.is_empty() {
            self.exclude_patterns = exclude.to_vec();
        }
        if !keywords.is_empty() {
            self.marker_keywords = keywords.to_vec();
        }
        self
    }

    /// Check every pattern and keyword once, before any file is touched.
    pub fn validate(&self) -> Result<(), ScanError> {
        self.path_filter()?;
        self.marker_matcher()?;
        Ok(())
    }

    pub fn path_filter(&self) -> Result<PathFilter, ScanError> {
        PathFilter::new(&self.include_patterns, &self.exclude_patterns)
    }

    pub fn marker_matcher(&self) -> Result<MarkerMatcher, ScanError> {
        if self.marker_keywords.is_empty() {
            return Ok(MarkerMatcher::default());
        }
        MarkerMatcher::new(&self.marker_keywords)
    }

    pub fn file_scanner(&self) -> Result<FileScanner, ScanError> {
        Ok(FileScanner::new(self.marker_matcher()?).max_file_size(self.max_file_size))
    }

    /// Worker count, at least one.
    pub fn workers(&self) -> usize {
        self.parallel_workers.max(1)
    }
}

fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "todoscan").map(|dirs| dirs.config_dir().join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert!(config.include_patterns.is_empty());
        assert!(config.exclude_patterns.contains(&"node_modules".to_string()));
        assert_eq!(config.marker_keywords.len(), 6);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = ScanConfig::from_yaml("include:\n  - \"*.go\"\nkeywords: [TODO, OPTIMIZE]\n").unwrap();
        assert_eq!(config.include_patterns, vec!["*.go"]);
        assert_eq!(config.marker_keywords, vec!["TODO", "OPTIMIZE"]);
        // Unset fields keep their defaults
        assert_eq!(config.parallel_workers, 4);
        assert!(config.exclude_patterns.contains(&".git".to_string()));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ScanConfig::from_yaml("  \n").unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_yaml_round_trip_through_init_output() {
        let yaml = ScanConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("exclude:"));
        assert_eq!(ScanConfig::from_yaml(&yaml).unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_invalid_glob_fails_validation() {
        let config = ScanConfig {
            exclude_patterns: vec!["[unclosed".to_string()],
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ScanError::InvalidGlobPattern { .. })
        ));
    }

    #[test]
    fn test_empty_keywords_use_defaults() {
        let config = ScanConfig {
            marker_keywords: Vec::new(),
            ..ScanConfig::default()
        };
        let matcher = config.marker_matcher().unwrap();
        assert_eq!(matcher.keywords().len(), 6);
    }

    #[test]
    fn test_overrides() {
        let config = ScanConfig::default().with_overrides(
            &[],
            &["target".to_string()],
            &["FIXME".to_string()],
        );
        assert!(config.include_patterns.is_empty());
        assert_eq!(config.exclude_patterns, vec!["target"]);
        assert_eq!(config.marker_keywords, vec!["FIXME"]);
    }

    #[test]
    fn test_discover_in_working_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".todoscan.yaml"), "parallel_workers: 2\n").unwrap();
        let found = ScanConfig::discover(temp.path()).unwrap();
        assert_eq!(found, temp.path().join(".todoscan.yaml"));
        assert_eq!(ScanConfig::parse_file(found).unwrap().parallel_workers, 2);
    }

    #[test]
    fn test_parse_file_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("todoscan.yaml");
        std::fs::write(&path, "parallel_workers: many\n").unwrap();
        let err = ScanConfig::parse_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("todoscan.yaml"));
    }
}
