//! Concurrent ingest of an export bundle.
//!
//! Every file is read and parsed on its own future; the results meet at a
//! single join point where they are sorted into [`MergeSources`] and merged.

use futures::future::join_all;
use reelstats_models::{CsvType, Movie, MovieDataset, ParseError, ParseResult, UserProfile};
use reelstats_sources::{detect_export_kind, parse_csv_content, parse_profile_csv, read_with_timeout, ExportFile, ExportKind};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::merge::{merge_movie_sources, MergeError, MergeSources};

/// Per-file outcome of an ingest
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub name: String,
    pub kind: ExportKind,
    pub success: bool,
    pub records: usize,
    pub errors: Vec<ParseError>,
}

impl FileReport {
    pub fn row_errors(&self) -> usize {
        self.errors.iter().filter(|e| !e.is_structural()).count()
    }
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub dataset: MovieDataset,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no export files were given")]
    NoFiles,
    #[error("{source}")]
    Merge {
        #[source]
        source: MergeError,
        files: Vec<FileReport>,
    },
}

impl IngestError {
    /// File reports gathered before the merge failed
    pub fn files(&self) -> &[FileReport] {
        match self {
            IngestError::NoFiles => &[],
            IngestError::Merge { files, .. } => files,
        }
    }
}

enum Parsed {
    Movies(CsvType, ParseResult<Vec<Movie>>),
    Profile(ParseResult<UserProfile>),
    Failed(ExportKind, Vec<ParseError>),
}

async fn read_and_parse(file: &dyn ExportFile, read_timeout: Duration) -> Parsed {
    let content = match read_with_timeout(file, read_timeout).await {
        Ok(content) => content,
        Err(e) => {
            warn!(file = %file.name(), error = %e, "Failed to read export file");
            return Parsed::Failed(
                ExportKind::Unknown,
                vec![ParseError::structural(0, "file", file.name(), format!("File reading error: {}", e))],
            );
        }
    };

    match detect_export_kind(file.name(), &content) {
        ExportKind::Movies(CsvType::Unknown) | ExportKind::Unknown => Parsed::Failed(
            ExportKind::Unknown,
            vec![ParseError::structural(1, "headers", "", "Unknown CSV type - missing required columns")],
        ),
        ExportKind::Movies(csv_type) => Parsed::Movies(csv_type, parse_csv_content(&content, csv_type)),
        ExportKind::Profile => Parsed::Profile(parse_profile_csv(&content)),
    }
}

fn append(slot: &mut Option<Vec<Movie>>, movies: Vec<Movie>) {
    slot.get_or_insert_with(Vec::new).extend(movies);
}

/// Read and parse every file concurrently, then sort the results into merge
/// inputs. Files that fail structurally are reported and contribute nothing.
/// Two files of the same movie role are concatenated; a second profile is
/// ignored.
pub async fn collect_sources(files: &[&dyn ExportFile], read_timeout: Duration) -> (MergeSources, Vec<FileReport>) {
    let parsed = join_all(files.iter().map(|file| read_and_parse(*file, read_timeout))).await;

    let mut sources = MergeSources::default();
    let mut reports = Vec::with_capacity(files.len());

    for (file, parsed) in files.iter().zip(parsed) {
        let name = file.name().to_string();
        let report = match parsed {
            Parsed::Movies(csv_type, result) => {
                let kind = ExportKind::Movies(csv_type);
                let ParseResult { success, data, errors } = result;
                let records = data.as_ref().map_or(0, Vec::len);
                if let Some(movies) = data {
                    match csv_type {
                        CsvType::Watched => append(&mut sources.watched, movies),
                        CsvType::Diary => append(&mut sources.diary, movies),
                        CsvType::Ratings => append(&mut sources.ratings, movies),
                        CsvType::Films => append(&mut sources.films, movies),
                        CsvType::Watchlist => append(&mut sources.watchlist, movies),
                        CsvType::Unknown => {}
                    }
                }
                FileReport { name, kind, success, records, errors }
            }
            Parsed::Profile(result) => {
                let ParseResult { success, data, errors } = result;
                let records = usize::from(data.is_some());
                match (data, sources.profile.is_some()) {
                    (Some(_), true) => warn!(file = %name, "Ignoring additional profile export"),
                    (Some(profile), false) => sources.profile = Some(profile),
                    (None, _) => {}
                }
                FileReport {
                    name,
                    kind: ExportKind::Profile,
                    success,
                    records,
                    errors,
                }
            }
            Parsed::Failed(kind, errors) => FileReport {
                name,
                kind,
                success: false,
                records: 0,
                errors,
            },
        };
        reports.push(report);
    }

    (sources, reports)
}

/// Ingest an export bundle into a merged dataset
pub async fn ingest_exports(files: &[&dyn ExportFile], read_timeout: Duration) -> Result<IngestOutcome, IngestError> {
    if files.is_empty() {
        return Err(IngestError::NoFiles);
    }

    let (sources, reports) = collect_sources(files, read_timeout).await;
    let failed = reports.iter().filter(|r| !r.success).count();

    match merge_movie_sources(&sources) {
        Ok(dataset) => {
            info!(
                files = reports.len(),
                failed,
                watched = dataset.watched.len(),
                "Ingested export bundle"
            );
            Ok(IngestOutcome { dataset, files: reports })
        }
        Err(source) => Err(IngestError::Merge { source, files: reports }),
    }
}
