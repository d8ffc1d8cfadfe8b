use csv::{ReaderBuilder, StringRecord, Trim};
use reelstats_models::{CsvType, Movie, ParseError, ParseResult};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::detect::{
    detect_csv_type, detect_export_kind, missing_columns, required_columns, strip_bom, ExportKind, COL_DATE,
    COL_NAME, COL_RATING, COL_REWATCH, COL_TAGS, COL_URI, COL_WATCHED_DATE, COL_YEAR,
};
use super::values::{
    is_valid_letterboxd_uri, is_valid_title, parse_date, parse_rating, parse_rewatch, parse_tags, parse_year,
};
use crate::traits::{read_with_timeout, ExportFile};

/// How long a single export read may take before it counts as failed
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) type HeaderMap = HashMap<String, usize>;

pub(crate) fn header_map(headers: &StringRecord) -> HeaderMap {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.to_string(), i))
        .collect()
}

/// Cell text for a named column; blank when the column or cell is missing
pub(crate) fn cell<'r>(record: &'r StringRecord, header_map: &HeaderMap, column: &str) -> &'r str {
    header_map
        .get(column)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
}

/// Columns every movie export carries
#[derive(Debug)]
struct BaseRow<'r> {
    date: &'r str,
    name: &'r str,
    year: &'r str,
    uri: &'r str,
}

#[derive(Debug)]
struct DiaryColumns<'r> {
    rating: &'r str,
    rewatch: &'r str,
    tags: &'r str,
    watched_date: &'r str,
}

/// A data row typed by the export it came from
#[derive(Debug)]
enum ExportRow<'r> {
    Watched(BaseRow<'r>),
    Diary(BaseRow<'r>, DiaryColumns<'r>),
    Ratings(BaseRow<'r>, &'r str),
    Films(BaseRow<'r>),
    Watchlist(BaseRow<'r>),
}

impl<'r> BaseRow<'r> {
    fn read(record: &'r StringRecord, header_map: &HeaderMap) -> Self {
        Self {
            date: cell(record, header_map, COL_DATE),
            name: cell(record, header_map, COL_NAME),
            year: cell(record, header_map, COL_YEAR),
            uri: cell(record, header_map, COL_URI),
        }
    }

    /// Validated (id, title, year)
    fn identity(&self, line: usize) -> Result<(String, String, i32), ParseError> {
        if !is_valid_title(self.name) {
            return Err(ParseError::row(line, COL_NAME, self.name, "Movie title is empty or invalid"));
        }
        let year = parse_year(self.year).ok_or_else(|| {
            ParseError::row(
                line,
                COL_YEAR,
                self.year,
                format!("Invalid year: \"{}\" (must be 1890-2100)", self.year),
            )
        })?;
        if !is_valid_letterboxd_uri(self.uri) {
            return Err(ParseError::row(
                line,
                COL_URI,
                self.uri,
                format!("Invalid Letterboxd URI: \"{}\"", self.uri),
            ));
        }
        Ok((self.uri.trim().to_string(), self.name.trim().to_string(), year))
    }

    fn required_date(&self, line: usize) -> Result<chrono::NaiveDate, ParseError> {
        parse_date(self.date).ok_or_else(|| {
            ParseError::row(
                line,
                COL_DATE,
                self.date,
                format!("Invalid date format: \"{}\" (expected YYYY-MM-DD)", self.date),
            )
        })
    }
}

impl<'r> ExportRow<'r> {
    fn read(csv_type: CsvType, record: &'r StringRecord, header_map: &HeaderMap) -> Self {
        let base = BaseRow::read(record, header_map);
        match csv_type {
            CsvType::Diary => ExportRow::Diary(
                base,
                DiaryColumns {
                    rating: cell(record, header_map, COL_RATING),
                    rewatch: cell(record, header_map, COL_REWATCH),
                    tags: cell(record, header_map, COL_TAGS),
                    watched_date: cell(record, header_map, COL_WATCHED_DATE),
                },
            ),
            CsvType::Ratings => ExportRow::Ratings(base, cell(record, header_map, COL_RATING)),
            CsvType::Films => ExportRow::Films(base),
            CsvType::Watchlist => ExportRow::Watchlist(base),
            CsvType::Watched | CsvType::Unknown => ExportRow::Watched(base),
        }
    }

    fn base(&self) -> &BaseRow<'r> {
        match self {
            ExportRow::Watched(base)
            | ExportRow::Films(base)
            | ExportRow::Watchlist(base)
            | ExportRow::Diary(base, _)
            | ExportRow::Ratings(base, _) => base,
        }
    }

    fn into_movie(self, line: usize) -> Result<Movie, ParseError> {
        let (id, title, year) = self.base().identity(line)?;

        match self {
            ExportRow::Watched(base) | ExportRow::Watchlist(base) => {
                Ok(Movie::new(id, title, year, base.required_date(line)?))
            }
            ExportRow::Films(base) => {
                let mut movie = Movie::new(id, title, year, base.required_date(line)?);
                movie.liked = true;
                Ok(movie)
            }
            ExportRow::Diary(base, diary) => {
                // Watched Date is the diary-accurate date; Date is when the entry was logged
                let logged = parse_date(base.date);
                let watched = parse_date(diary.watched_date).or(logged).ok_or_else(|| {
                    let value = if diary.watched_date.is_empty() { base.date } else { diary.watched_date };
                    ParseError::row(line, COL_WATCHED_DATE, value, "Could not parse watched date")
                })?;

                let rating = parse_rating(diary.rating);
                if rating.is_none() && !diary.rating.is_empty() {
                    warn!(row = line, value = %diary.rating, "Ignoring unusable diary rating");
                }

                let mut movie = Movie::new(id, title, year, logged.unwrap_or(watched));
                movie.watched_date = Some(watched);
                movie.rating = rating;
                movie.rating_date = rating.and(logged);
                movie.rewatch = parse_rewatch(diary.rewatch);
                movie.tags = parse_tags(diary.tags).into_iter().collect();
                Ok(movie)
            }
            ExportRow::Ratings(base, rating) => {
                let value = parse_rating(rating).ok_or_else(|| {
                    ParseError::row(
                        line,
                        COL_RATING,
                        rating,
                        format!("Invalid rating: \"{}\" (must be 0.5-5.0)", rating),
                    )
                })?;
                let date = base.required_date(line)?;
                let mut movie = Movie::new(id, title, year, date);
                movie.rating = Some(value);
                movie.rating_date = Some(date);
                Ok(movie)
            }
        }
    }
}

/// Parse the text of a Letterboxd movie export.
///
/// `Unknown` asks for the type to be detected from the header row. Bad rows
/// are skipped and reported; only an unusable file fails as a whole.
pub fn parse_csv_content(content: &str, csv_type: CsvType) -> ParseResult<Vec<Movie>> {
    let content = strip_bom(content);
    if content.trim().is_empty() {
        return ParseResult::failure(vec![ParseError::structural(0, "content", "", "CSV file is empty")]);
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            return ParseResult::failure(vec![ParseError::structural(
                1,
                "headers",
                "",
                format!("CSV parsing error: {}", e),
            )])
        }
    };
    let header_names: Vec<&str> = headers.iter().collect();
    debug!("Available CSV columns: {:?}", header_names);

    let csv_type = match csv_type {
        CsvType::Unknown => detect_csv_type(&header_names),
        known => known,
    };
    if csv_type == CsvType::Unknown {
        return ParseResult::failure(vec![ParseError::structural(
            1,
            "headers",
            header_names.join(","),
            "Unknown CSV type - missing required columns",
        )]);
    }

    let missing = missing_columns(&header_names, required_columns(csv_type));
    if !missing.is_empty() {
        return ParseResult::failure(
            missing
                .into_iter()
                .map(|col| {
                    let message = format!("Missing required column: {}", col);
                    ParseError::structural(1, col, "", message)
                })
                .collect(),
        );
    }

    let header_map = header_map(&headers);
    let mut movies = Vec::new();
    let mut errors = Vec::new();
    let mut row_count = 0;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                return ParseResult::failure(vec![ParseError::structural(
                    line,
                    "content",
                    "",
                    format!("CSV parsing error: {}", e),
                )]);
            }
        };
        row_count += 1;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(row_count + 1);

        let row = ExportRow::read(csv_type, &record, &header_map);

        // Debug first few rows
        if row_count <= 3 {
            debug!(row = line, csv_type = %csv_type, row_data = ?row, "Parsing Letterboxd CSV row");
        }

        match row.into_movie(line) {
            Ok(movie) => movies.push(movie),
            Err(error) => {
                debug!(row = line, field = %error.field, "Skipping row: {}", error.message);
                errors.push(error);
            }
        }
    }

    info!(
        csv_type = %csv_type,
        rows = row_count,
        movies = movies.len(),
        errors = errors.len(),
        "Parsed Letterboxd export"
    );
    ParseResult::ok(movies, errors)
}

/// Read an export file and parse it, detecting its type from the file name
/// and falling back to the header row.
pub async fn parse_letterboxd_csv(file: Option<&dyn ExportFile>) -> ParseResult<Vec<Movie>> {
    parse_letterboxd_csv_with_timeout(file, DEFAULT_READ_TIMEOUT).await
}

pub async fn parse_letterboxd_csv_with_timeout(
    file: Option<&dyn ExportFile>,
    read_timeout: Duration,
) -> ParseResult<Vec<Movie>> {
    let Some(file) = file else {
        return ParseResult::failure(vec![ParseError::structural(0, "file", "", "No file provided")]);
    };

    let content = match read_with_timeout(file, read_timeout).await {
        Ok(content) => content,
        Err(e) => {
            warn!(file = %file.name(), error = %e, "Failed to read export file");
            return ParseResult::failure(vec![ParseError::structural(
                0,
                "file",
                file.name(),
                format!("File reading error: {}", e),
            )]);
        }
    };

    match detect_export_kind(file.name(), &content) {
        ExportKind::Movies(csv_type) => parse_csv_content(&content, csv_type),
        ExportKind::Profile | ExportKind::Unknown => ParseResult::failure(vec![ParseError::structural(
            1,
            "headers",
            "",
            "Unknown CSV type - missing required columns",
        )]),
    }
}

#[cfg(test)]
mod tests;
