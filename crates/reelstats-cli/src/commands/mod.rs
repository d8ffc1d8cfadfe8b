pub mod analyze;
pub mod canon;
pub mod config;
pub mod validate;

use crate::output::{styled_table, Output};
use color_eyre::Result;
use comfy_table::Cell;
use owo_colors::OwoColorize;
use reelstats_config::Config;
use reelstats_core::{ingest_exports, FileReport, IngestError, IngestOutcome};
use reelstats_sources::{ExportFile, PathExport};
use std::path::PathBuf;
use std::time::Duration;

/// Row diagnostics printed per file before eliding the rest
const MAX_ERRORS_SHOWN: usize = 10;

pub fn read_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.ingest.read_timeout_secs)
}

pub fn path_exports(files: &[PathBuf]) -> Vec<PathExport> {
    files.iter().cloned().map(PathExport::new).collect()
}

/// Ingest files from disk, printing per-file diagnostics either way
pub async fn ingest_paths(files: &[PathBuf], config: &Config, output: &Output) -> Result<IngestOutcome> {
    let exports = path_exports(files);
    let refs: Vec<&dyn ExportFile> = exports.iter().map(|e| e as &dyn ExportFile).collect();

    match ingest_exports(&refs, read_timeout(config)).await {
        Ok(outcome) => {
            report_problems(&outcome.files, output);
            Ok(outcome)
        }
        Err(e) => {
            report_problems(e.files(), output);
            let hint = match &e {
                IngestError::Merge { .. } => " (include watched.csv from your Letterboxd export)",
                IngestError::NoFiles => "",
            };
            Err(color_eyre::eyre::eyre!("Ingest failed: {}{}", e, hint))
        }
    }
}

/// One line per file that failed or had rejected rows. None for JSON output,
/// whose payload already carries the reports.
pub fn problem_lines(reports: &[FileReport], output: &Output) -> Vec<String> {
    if !output.is_human() {
        return Vec::new();
    }
    reports
        .iter()
        .filter_map(|report| {
            if !report.success {
                let reason = report
                    .errors
                    .first()
                    .map(|e| e.message.as_str())
                    .unwrap_or("unknown error");
                Some(format!("{}: skipped ({})", report.name, reason))
            } else if !report.errors.is_empty() {
                Some(format!("{}: {} row(s) rejected", report.name, report.errors.len()))
            } else {
                None
            }
        })
        .collect()
}

/// Warn about files that failed or had rejected rows
pub fn report_problems(reports: &[FileReport], output: &Output) {
    for line in problem_lines(reports, output) {
        output.warn(line);
    }
}

/// Per-file table: detected kind, outcome, record count
pub fn file_table(reports: &[FileReport]) -> comfy_table::Table {
    let mut table = styled_table(&["File", "Type", "Status", "Records", "Errors"]);
    for report in reports {
        let status = if !report.success {
            "failed".red().to_string()
        } else if report.errors.is_empty() {
            "ok".green().to_string()
        } else {
            "partial".yellow().to_string()
        };
        table.add_row(vec![
            Cell::new(&report.name),
            Cell::new(report.kind.to_string()),
            Cell::new(status),
            Cell::new(report.records),
            Cell::new(report.errors.len()),
        ]);
    }
    table
}

/// Error lines for one file, capped
pub fn error_lines(report: &FileReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .errors
        .iter()
        .take(MAX_ERRORS_SHOWN)
        .map(|e| format!("  {}", e))
        .collect();
    if report.errors.len() > MAX_ERRORS_SHOWN {
        lines.push(format!("  ... and {} more", report.errors.len() - MAX_ERRORS_SHOWN));
    }
    lines
}
