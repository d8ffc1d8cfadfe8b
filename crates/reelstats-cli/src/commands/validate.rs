use super::{error_lines, file_table, path_exports, read_timeout};
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use reelstats_config::Config;
use reelstats_core::{collect_sources, FileReport};
use reelstats_models::ValidationError;
use reelstats_sources::letterboxd::read_headers;
use reelstats_sources::{read_with_timeout, validate_csv, ExportFile, ExportKind};
use serde_json::json;
use std::path::PathBuf;

/// Header problems for a file no export type matched
async fn header_diagnostics(file: &dyn ExportFile, config: &Config) -> Vec<ValidationError> {
    match read_with_timeout(file, read_timeout(config)).await {
        Ok(content) => validate_csv(&read_headers(&content).unwrap_or_default()),
        Err(_) => Vec::new(),
    }
}

pub async fn run_validate(files: Vec<PathBuf>, config: &Config, output: &Output) -> Result<()> {
    let exports = path_exports(&files);
    let refs: Vec<&dyn ExportFile> = exports.iter().map(|e| e as &dyn ExportFile).collect();

    let (_, reports) = collect_sources(&refs, read_timeout(config)).await;

    let mut header_errors: Vec<Vec<ValidationError>> = Vec::with_capacity(reports.len());
    for (file, report) in refs.iter().zip(&reports) {
        let errors = if report.kind == ExportKind::Unknown {
            header_diagnostics(*file, config).await
        } else {
            Vec::new()
        };
        header_errors.push(errors);
    }

    let failed = reports.iter().filter(|r| !r.success).count();

    match output.format() {
        OutputFormat::Human => {
            output.table("Export Files", &file_table(&reports));
            for (report, headers) in reports.iter().zip(&header_errors) {
                print_diagnostics(report, headers, output);
            }
            if failed == 0 {
                output.success(format!("{} file(s) valid", reports.len()));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            let files: Vec<_> = reports
                .iter()
                .zip(&header_errors)
                .map(|(report, headers)| {
                    json!({
                        "report": report,
                        "header_errors": headers,
                    })
                })
                .collect();
            output.json(&json!({ "files": files, "failed": failed }));
        }
    }

    if failed > 0 {
        return Err(color_eyre::eyre::eyre!("{} of {} file(s) failed validation", failed, reports.len()));
    }
    Ok(())
}

fn print_diagnostics(report: &FileReport, headers: &[ValidationError], output: &Output) {
    if report.errors.is_empty() && headers.is_empty() {
        return;
    }
    output.warn(format!("{}:", report.name));
    for error in headers {
        output.info(format!("  {}: {}", error.field, error.message));
    }
    for line in error_lines(report) {
        output.info(line);
    }
}
