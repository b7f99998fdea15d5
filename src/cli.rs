//! Command-line interface for todoscan.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::report::{self, OutputFormat};
use crate::scan::{self, languages, ScanCancellation};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Find TODO, FIXME, HACK, BUG, NOTE and XXX comments in a source tree.
///
/// Each marker is reported with its location and a fingerprint that stays
/// the same across scans as long as the marker's path, line, type and text
/// do not change.
#[derive(Parser)]
#[command(name = "todoscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a directory for marker comments
    Scan(ScanArgs),
    /// Write a default config file
    Init(InitArgs),
    /// List supported languages and their comment syntax
    Languages,
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Exclude pattern (can be repeated; replaces configured excludes)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Include pattern (can be repeated; replaces configured includes)
    #[arg(short, long)]
    pub include: Vec<String>,

    /// Marker keyword (can be repeated; replaces configured keywords)
    #[arg(short, long)]
    pub keyword: Vec<String>,

    /// Worker threads (default: from config)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Exit with status 1 when any marker is found
    #[arg(long)]
    pub fail_on_markers: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "todoscan.yaml")]
    pub output: PathBuf,
}

/// Load the config for a scan: explicit path, discovered file, or defaults.
fn load_config(args: &ScanArgs) -> anyhow::Result<ScanConfig> {
    let path = match &args.config {
        Some(p) => Some(p.clone()),
        None => ScanConfig::discover(&std::env::current_dir()?),
    };

    let mut config = match path {
        Some(p) => {
            debug!(path = %p.display(), "loading config");
            ScanConfig::parse_file(&p)?
        }
        None => ScanConfig::default(),
    };
    config = config.with_overrides(&args.include, &args.exclude, &args.keyword);
    if let Some(jobs) = args.jobs {
        config.parallel_workers = jobs;
    }
    Ok(config)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let format = match args.format.parse::<OutputFormat>() {
        Ok(f) => f,
        Err(_) => {
            eprintln!(
                "Error: invalid format {:?}, must be 'pretty' or 'json'",
                args.format
            );
            return Ok(EXIT_ERROR);
        }
    };

    let config = match load_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    info!(root = %root.display(), workers = config.workers(), "scanning");
    let report = scan::scan_tree(&root, &config, &ScanCancellation::new())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => report::write_json(&mut out, &report)?,
        OutputFormat::Pretty => report::write_pretty(&mut out, &report)?,
    }
    out.flush()?;

    if args.fail_on_markers && !report.is_empty() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    let content = ScanConfig::default().to_yaml()?;
    if let Err(e) = std::fs::write(&args.output, content) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize excludes and keywords", args.output.display());
    println!("  2. Run: todoscan scan . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// Run the languages command.
pub fn run_languages() -> anyhow::Result<i32> {
    println!("{:<12} {:<22} {:<10} MULTI-LINE", "LANGUAGE", "EXTENSIONS", "LINE");
    for lang in languages::all() {
        let blocks: Vec<String> = lang
            .multi_line_delimiters
            .iter()
            .map(|(start, end)| format!("{} {}", start, end))
            .collect();
        println!(
            "{:<12} {:<22} {:<10} {}",
            lang.name,
            lang.extensions.join(" "),
            lang.single_line_prefixes.join(" "),
            blocks.join(", ")
        );
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan_args(config: Option<PathBuf>) -> ScanArgs {
        ScanArgs {
            path: PathBuf::from("."),
            config,
            format: "pretty".to_string(),
            exclude: Vec::new(),
            include: vec!["*.rs".to_string()],
            keyword: Vec::new(),
            jobs: Some(2),
            fail_on_markers: false,
        }
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("todoscan.yaml");
        std::fs::write(&path, "include: [\"*.go\"]\nkeywords: [TODO]\n").unwrap();

        let config = load_config(&scan_args(Some(path))).unwrap();
        assert_eq!(config.include_patterns, vec!["*.rs"]);
        assert_eq!(config.marker_keywords, vec!["TODO"]);
        assert_eq!(config.parallel_workers, 2);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("todoscan.yaml");

        assert_eq!(run_init(&InitArgs { output: output.clone() }).unwrap(), EXIT_SUCCESS);
        let written = ScanConfig::parse_file(&output).unwrap();
        assert_eq!(written, ScanConfig::default());

        assert_eq!(run_init(&InitArgs { output }).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_scan_rejects_unknown_format() {
        let mut args = scan_args(None);
        args.format = "sarif".to_string();
        assert_eq!(run_scan(&args).unwrap(), EXIT_ERROR);
    }
}
