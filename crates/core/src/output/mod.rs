mod json;
mod yaml;

pub use json::to_json;
pub use yaml::to_yaml;

use crate::models::{FileOutcome, RunReport};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per rewritten file
    Text,
    Json,
    Yaml,
    Summary,
}

/// Render a RunReport. `verbose` adds unchanged files to the text listing.
pub fn format_report(
    report: &RunReport,
    format: OutputFormat,
    verbose: bool,
) -> Result<String, FormatError> {
    match format {
        OutputFormat::Text => Ok(format_text(report, verbose)),
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Summary => Ok(format_summary(report)),
    }
}

/// Rewritten files, and with `verbose` the ones left alone. Skipped files
/// were already reported while the run was in progress.
pub fn format_text(report: &RunReport, verbose: bool) -> String {
    let mut output = String::new();

    for file in &report.files {
        match file.outcome {
            FileOutcome::Changed => {
                output.push_str(&format!("{}\n", file.path.display()));
            }
            FileOutcome::Unchanged | FileOutcome::NoImports if verbose => {
                output.push_str(&format!("{}: no changes\n", file.path.display()));
            }
            _ => {}
        }
    }

    output
}

/// Generate a human-readable summary
pub fn format_summary(report: &RunReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Import Blocks Summary\n\
         =====================\n\
         Root: {}\n\n",
        report.root.display()
    ));

    output.push_str(&format!(
        "Files Processed: {}\n\
         - Rewritten: {}\n\
         - Unchanged: {}\n\
         - Without imports: {}\n\
         - Skipped: {}\n\n",
        report.stats.total_files,
        report.stats.changed,
        report.stats.unchanged,
        report.stats.no_imports,
        report.stats.skipped
    ));

    let skipped: Vec<_> = report
        .files
        .iter()
        .filter_map(|f| match &f.outcome {
            FileOutcome::Skipped { reason } => Some((&f.path, reason)),
            _ => None,
        })
        .collect();
    if !skipped.is_empty() {
        output.push_str("Skipped Files:\n");
        for (path, reason) in skipped {
            output.push_str(&format!("  {}: {}\n", path.display(), reason));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Duration: {}ms\n\
         Timestamp: {}\n\
         Tool Version: {}\n",
        report.metadata.duration_ms, report.metadata.timestamp, report.metadata.tool_version
    ));

    output
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileReport, RunMetadata, RunStats};
    use std::path::PathBuf;

    fn report() -> RunReport {
        let files = vec![
            FileReport {
                path: PathBuf::from("a.go"),
                outcome: FileOutcome::Changed,
            },
            FileReport {
                path: PathBuf::from("b.go"),
                outcome: FileOutcome::Unchanged,
            },
            FileReport {
                path: PathBuf::from("c.go"),
                outcome: FileOutcome::Skipped {
                    reason: "error parsing: syntax error at line 3".to_string(),
                },
            },
        ];
        RunReport {
            root: PathBuf::from("/work"),
            stats: RunStats::from_files(&files),
            files,
            metadata: RunMetadata::default(),
        }
    }

    #[test]
    fn test_text_lists_changed_files() {
        assert_eq!(format_text(&report(), false), "a.go\n");
    }

    #[test]
    fn test_text_verbose_lists_unchanged_files() {
        assert_eq!(format_text(&report(), true), "a.go\nb.go: no changes\n");
    }

    #[test]
    fn test_summary() {
        let summary = format_summary(&report());
        assert!(summary.contains("Files Processed: 3"));
        assert!(summary.contains("- Rewritten: 1"));
        assert!(summary.contains("c.go: error parsing: syntax error at line 3"));
    }
}
