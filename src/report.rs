//! Output formatting for scan results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output grouped by file
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::scan::{ExtractedMarker, ScanReport, ScanStats};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown format: {}", s)),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON document.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub root: String,
    pub stats: ScanStats,
    pub counts: Vec<TypeCount>,
    pub markers: Vec<ExtractedMarker>,
}

/// Number of markers of one type.
#[derive(Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub marker_type: String,
    pub count: usize,
}

impl JsonReport {
    pub fn from_scan(report: &ScanReport) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            root: report.root.clone(),
            stats: report.stats.clone(),
            counts: report
                .counts_by_type()
                .into_iter()
                .map(|(marker_type, count)| TypeCount { marker_type, count })
                .collect(),
            markers: report.markers.clone(),
        }
    }
}

/// Write results as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, report: &ScanReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::from_scan(report))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty<W: Write>(out: &mut W, report: &ScanReport) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "todoscan".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), report.root)?;
    writeln!(out)?;

    if report.markers.is_empty() {
        writeln!(out, "  {}", "No markers found".green())?;
    } else {
        write_markers(out, &report.markers)?;
    }
    writeln!(out)?;

    write_summary(out, report)?;
    writeln!(out)?;
    Ok(())
}

fn write_markers<W: Write>(out: &mut W, markers: &[ExtractedMarker]) -> anyhow::Result<()> {
    let mut current_file: Option<&str> = None;

    for m in markers {
        if current_file != Some(m.relative_path.as_str()) {
            if current_file.is_some() {
                writeln!(out)?;
            }
            writeln!(out, "  {}", m.relative_path.blue().bold())?;
            current_file = Some(m.relative_path.as_str());
        }

        let location = format!("{}:{}", m.line_number, m.column);
        write!(out, "    {:>8}  ", location.dimmed())?;
        write!(out, "{}", colored_type(&m.marker_type))?;
        if let Some(tag) = &m.tag {
            write!(out, "{}", format!("({})", tag).dimmed())?;
        }
        if m.content.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, "  {}", m.content)?;
        }
    }

    Ok(())
}

fn colored_type(marker_type: &str) -> ColoredString {
    let padded = format!("{:<5}", marker_type);
    match marker_type {
        "BUG" | "FIXME" => padded.red(),
        "HACK" | "XXX" => padded.yellow(),
        "NOTE" => padded.blue(),
        _ => padded.cyan(),
    }
}

fn write_summary<W: Write>(out: &mut W, report: &ScanReport) -> anyhow::Result<()> {
    let stats = &report.stats;
    let plural = if stats.markers_found != 1 { "s" } else { "" };
    write!(
        out,
        "  {} marker{} in {} file{}",
        stats.markers_found.to_string().bold(),
        plural,
        stats.files_scanned,
        if stats.files_scanned != 1 { "s" } else { "" }
    )?;
    if stats.files_skipped > 0 {
        write!(out, "  {}", format!("({} skipped)", stats.files_skipped).dimmed())?;
    }
    if stats.cancelled {
        write!(out, "  {}", "(cancelled)".yellow())?;
    }
    writeln!(out)?;

    let counts = report.counts_by_type();
    if !counts.is_empty() {
        let parts: Vec<String> = counts
            .iter()
            .map(|(t, n)| format!("{} {}", t, n))
            .collect();
        writeln!(out, "  {}", parts.join("  ").dimmed())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::fingerprint;
    use chrono::Utc;

    fn marker(path: &str, line: usize, kind: &str, content: &str) -> ExtractedMarker {
        ExtractedMarker {
            relative_path: path.to_string(),
            line_number: line,
            column: 4,
            marker_type: kind.to_string(),
            tag: None,
            content: content.to_string(),
            discovered_at: Utc::now(),
            fingerprint: fingerprint(path, line, kind, content),
        }
    }

    fn sample() -> ScanReport {
        let markers = vec![
            marker("a.go", 3, "TODO", "fix this"),
            marker("a.go", 9, "FIXME", "handle nil"),
            marker("b/c.py", 1, "TODO", "docs"),
        ];
        ScanReport {
            root: "/tmp/project".to_string(),
            stats: ScanStats {
                files_scanned: 2,
                markers_found: markers.len(),
                ..ScanStats::default()
            },
            markers,
        }
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Pretty".parse::<OutputFormat>(), Ok(OutputFormat::Pretty));
        assert!("sarif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_json_report_structure() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["root"], "/tmp/project");
        assert_eq!(value["stats"]["files_scanned"], 2);
        assert_eq!(value["markers"].as_array().unwrap().len(), 3);
        assert_eq!(value["markers"][0]["marker_type"], "TODO");
        assert!(value["markers"][0].get("tag").is_none());
        assert_eq!(value["counts"][0]["type"], "FIXME");
        assert_eq!(value["counts"][1]["count"], 2);
    }

    #[test]
    fn test_pretty_groups_by_file() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.matches("a.go").count(), 1);
        assert!(text.contains("b/c.py"));
        assert!(text.contains("3:4"));
        assert!(text.contains("3 markers in 2 files"));
        assert!(text.contains("FIXME 1  TODO 2"));
    }

    #[test]
    fn test_pretty_empty() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_pretty(&mut buf, &ScanReport::default()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("No markers found"));
    }
}
