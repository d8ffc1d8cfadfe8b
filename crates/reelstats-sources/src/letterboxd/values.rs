//! Cell-level parsing for Letterboxd export values.
//!
//! Every function here takes the raw (possibly padded) cell text and returns
//! `None`/`false` for anything it cannot interpret. Deciding whether that is a
//! row error or an absent field is the caller's job.

use chrono::NaiveDate;
use tracing::warn;

pub const MIN_YEAR: i32 = 1890;
pub const MAX_YEAR: i32 = 2100;
pub const MIN_RATING: f64 = 0.5;
pub const MAX_RATING: f64 = 5.0;

const URI_PREFIX: &str = "https://boxd.it/";

/// Parse an export date (YYYY-MM-DD)
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(value = %value, error = %e, "Invalid date value");
            None
        }
    }
}

/// Parse a star rating, rounded to the nearest half star.
/// Values outside 0.5-5.0 are rejected.
pub fn parse_rating(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(rating) if (MIN_RATING..=MAX_RATING).contains(&rating) => Some((rating * 2.0).round() / 2.0),
        _ => {
            warn!(value = %value, "Invalid rating value");
            None
        }
    }
}

/// Comma-separated tag list; blanks dropped
pub fn parse_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Diary rewatch marker is "Yes" or blank
pub fn parse_rewatch(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

/// Release year within the plausible range
pub fn parse_year(value: &str) -> Option<i32> {
    value
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|year| (MIN_YEAR..=MAX_YEAR).contains(year))
}

pub fn is_valid_title(value: &str) -> bool {
    !value.trim().is_empty()
}

/// `https://boxd.it/<alphanumeric>`
pub fn is_valid_letterboxd_uri(value: &str) -> bool {
    match value.trim().strip_prefix(URI_PREFIX) {
        Some(slug) => !slug.is_empty() && slug.chars().all(|c| c.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Blank-after-trim becomes `None`
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
