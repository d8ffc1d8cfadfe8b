use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a Letterboxd export file, identified by its header shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CsvType {
    Watched,
    Diary,
    Ratings,
    Films, // Liked films
    Watchlist,
    Unknown,
}

impl CsvType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CsvType::Watched => "watched",
            CsvType::Diary => "diary",
            CsvType::Ratings => "ratings",
            CsvType::Films => "films",
            CsvType::Watchlist => "watchlist",
            CsvType::Unknown => "unknown",
        }
    }

    /// Map a standard export file name (`diary.csv`, ...) to its role.
    /// Anything else is `Unknown` and must be detected from headers.
    pub fn from_file_name(name: &str) -> Self {
        let base = name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(name)
            .trim()
            .to_lowercase();
        match base.as_str() {
            "watched.csv" => CsvType::Watched,
            "diary.csv" => CsvType::Diary,
            "ratings.csv" => CsvType::Ratings,
            "films.csv" | "likes.csv" => CsvType::Films,
            "watchlist.csv" => CsvType::Watchlist,
            _ => CsvType::Unknown,
        }
    }
}

impl fmt::Display for CsvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an error sinks the whole file or only one row
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Structural,
    Row,
}

/// A single parsing problem, tagged with where it happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub row: usize, // 1-based file line, header = 1; 0 when not tied to a line
    pub field: String,
    pub value: String,
    pub message: String,
}

impl ParseError {
    pub fn structural(row: usize, field: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Structural,
            row,
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn row(row: usize, field: impl Into<String>, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Row,
            row,
            field: field.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind == ErrorKind::Structural
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} [{}]: {}", self.row, self.field, self.message)
    }
}

/// Outcome of parsing one file.
///
/// `success` is false only for structural failures, in which case `data` is
/// `None`. Row-level problems leave `success` true and are listed in `errors`
/// next to the rows that did parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub errors: Vec<ParseError>,
}

impl<T> ParseResult<T> {
    pub fn ok(data: T, errors: Vec<ParseError>) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors,
        }
    }

    pub fn failure(errors: Vec<ParseError>) -> Self {
        Self {
            success: false,
            data: None,
            errors,
        }
    }

    /// Parsed with no errors of any kind
    pub fn is_clean(&self) -> bool {
        self.success && self.errors.is_empty()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Header-level problem reported by validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}
