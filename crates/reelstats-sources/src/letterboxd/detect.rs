use csv::{ReaderBuilder, Trim};
use reelstats_models::{CsvType, ValidationError};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

pub const COL_DATE: &str = "Date";
pub const COL_NAME: &str = "Name";
pub const COL_YEAR: &str = "Year";
pub const COL_URI: &str = "Letterboxd URI";
pub const COL_RATING: &str = "Rating";
pub const COL_REWATCH: &str = "Rewatch";
pub const COL_TAGS: &str = "Tags";
pub const COL_WATCHED_DATE: &str = "Watched Date";

/// Shared by watched, films and watchlist exports
pub const BASE_COLUMNS: [&str; 4] = [COL_DATE, COL_NAME, COL_YEAR, COL_URI];
pub const DIARY_COLUMNS: [&str; 8] = [
    COL_DATE,
    COL_NAME,
    COL_YEAR,
    COL_URI,
    COL_RATING,
    COL_REWATCH,
    COL_TAGS,
    COL_WATCHED_DATE,
];
pub const RATINGS_COLUMNS: [&str; 5] = [COL_DATE, COL_NAME, COL_YEAR, COL_URI, COL_RATING];

pub const PROFILE_COLUMN_USERNAME: &str = "Username";
pub const PROFILE_FILE_NAME: &str = "profile.csv";

/// Columns a file of the given role must carry
pub fn required_columns(csv_type: CsvType) -> &'static [&'static str] {
    match csv_type {
        CsvType::Diary => &DIARY_COLUMNS,
        CsvType::Ratings => &RATINGS_COLUMNS,
        CsvType::Watched | CsvType::Films | CsvType::Watchlist | CsvType::Unknown => &BASE_COLUMNS,
    }
}

/// Classify a header row. Names are matched case-sensitively after trimming.
///
/// watched, films and watchlist share one shape and can't be told apart by
/// headers alone; all three come back as `Watched`.
pub fn detect_csv_type<S: AsRef<str>>(headers: &[S]) -> CsvType {
    let normalized: HashSet<&str> = headers
        .iter()
        .map(|h| h.as_ref().trim())
        .filter(|h| !h.is_empty())
        .collect();
    if normalized.is_empty() {
        return CsvType::Unknown;
    }

    let has_all = |cols: &[&str]| cols.iter().all(|c| normalized.contains(c));

    if normalized.len() == DIARY_COLUMNS.len() && has_all(&DIARY_COLUMNS) {
        CsvType::Diary
    } else if normalized.len() == RATINGS_COLUMNS.len() && has_all(&RATINGS_COLUMNS) {
        CsvType::Ratings
    } else if has_all(&BASE_COLUMNS) {
        CsvType::Watched
    } else {
        CsvType::Unknown
    }
}

/// Columns of `expected` that `headers` lacks
pub fn missing_columns<S: AsRef<str>>(headers: &[S], expected: &[&str]) -> Vec<String> {
    expected
        .iter()
        .filter(|col| !headers.iter().any(|h| h.as_ref().trim() == **col))
        .map(|col| col.to_string())
        .collect()
}

/// One error per missing required column of the detected shape
pub fn validate_csv<S: AsRef<str>>(headers: &[S]) -> Vec<ValidationError> {
    if headers.iter().all(|h| h.as_ref().trim().is_empty()) {
        return vec![ValidationError {
            field: "headers".to_string(),
            message: "CSV file has no headers".to_string(),
        }];
    }

    let csv_type = detect_csv_type(headers);
    let mut errors: Vec<ValidationError> = missing_columns(headers, required_columns(csv_type))
        .into_iter()
        .map(|col| ValidationError {
            message: format!("Missing required column: {}", col),
            field: col,
        })
        .collect();

    if errors.is_empty() && csv_type == CsvType::Unknown {
        errors.push(ValidationError {
            field: "headers".to_string(),
            message: format!("Unknown CSV type - missing required columns ({})", BASE_COLUMNS.join(", ")),
        });
    }

    errors
}

/// Read just the header row of a CSV document.
/// Returns `None` for content with no header line.
pub fn read_headers(content: &str) -> Option<Vec<String>> {
    let content = strip_bom(content);
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader.headers().ok()?;
    let headers: Vec<String> = headers.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        None
    } else {
        Some(headers)
    }
}

pub(crate) fn strip_bom(content: &str) -> &str {
    content.strip_prefix('\u{feff}').unwrap_or(content)
}

/// What a file in an export bundle contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "csv_type")]
pub enum ExportKind {
    Movies(CsvType),
    Profile,
    Unknown,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportKind::Movies(csv_type) => write!(f, "{}", csv_type),
            ExportKind::Profile => f.write_str("profile"),
            ExportKind::Unknown => f.write_str("unknown"),
        }
    }
}

/// Diary columns plus extras, the shape of `reviews.csv`. Its rows repeat
/// diary viewings under per-entry URIs.
fn is_review_log<S: AsRef<str>>(headers: &[S]) -> bool {
    headers.len() > DIARY_COLUMNS.len()
        && DIARY_COLUMNS
            .iter()
            .all(|col| headers.iter().any(|h| h.as_ref().trim() == *col))
}

/// Route a file by its name first, then by its header row.
/// Review logs are not routed anywhere.
pub fn detect_export_kind(file_name: &str, content: &str) -> ExportKind {
    let by_name = CsvType::from_file_name(file_name);
    if by_name != CsvType::Unknown {
        debug!(file = %file_name, csv_type = %by_name, "Detected export type from file name");
        return ExportKind::Movies(by_name);
    }

    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    if base.trim().eq_ignore_ascii_case(PROFILE_FILE_NAME) {
        return ExportKind::Profile;
    }

    let Some(headers) = read_headers(content) else {
        return ExportKind::Unknown;
    };
    if is_review_log(&headers) {
        debug!(file = %file_name, "Skipping review log");
        return ExportKind::Unknown;
    }
    match detect_csv_type(&headers) {
        CsvType::Unknown if headers.iter().any(|h| h == PROFILE_COLUMN_USERNAME) => ExportKind::Profile,
        CsvType::Unknown => ExportKind::Unknown,
        csv_type => {
            debug!(file = %file_name, csv_type = %csv_type, "Detected export type from headers");
            ExportKind::Movies(csv_type)
        }
    }
}
