use csv::{ReaderBuilder, Trim};
use reelstats_models::{FavoriteFilm, ParseError, ParseResult, UserProfile, MAX_FAVORITE_FILMS};
use tracing::{debug, warn};

use super::detect::{strip_bom, PROFILE_COLUMN_USERNAME};
use super::parser::{cell, header_map};
use super::values::{non_empty, parse_date};

const COL_DATE_JOINED: &str = "Date Joined";
const COL_GIVEN_NAME: &str = "Given Name";
const COL_FAMILY_NAME: &str = "Family Name";
const COL_EMAIL: &str = "Email Address";
const COL_LOCATION: &str = "Location";
const COL_WEBSITE: &str = "Website";
const COL_BIO: &str = "Bio";
const COL_PRONOUN: &str = "Pronoun";
const COL_FAVORITE_FILMS: &str = "Favorite Films";

const MAX_USERNAME_LEN: usize = 255;

/// Parse the profile export. Only the first data row is read.
pub fn parse_profile_csv(content: &str) -> ParseResult<UserProfile> {
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
            return ParseResult::failure(vec![ParseError::structural(1, "headers", "", format!("Parse error: {}", e))])
        }
    };
    let header_map = header_map(&headers);

    let record = match reader.records().next() {
        Some(Ok(record)) => record,
        Some(Err(e)) => {
            let line = e.position().map(|p| p.line() as usize).unwrap_or(2);
            return ParseResult::failure(vec![ParseError::structural(line, "content", "", format!("Parse error: {}", e))]);
        }
        None => {
            return ParseResult::failure(vec![ParseError::structural(
                1,
                "content",
                "",
                "No data rows in profile CSV",
            )])
        }
    };
    let line = record.position().map(|p| p.line() as usize).unwrap_or(2);

    let Some(username) = non_empty(cell(&record, &header_map, PROFILE_COLUMN_USERNAME)) else {
        return ParseResult::failure(vec![ParseError::structural(
            line,
            PROFILE_COLUMN_USERNAME,
            "",
            "Username is required",
        )]);
    };
    if username.chars().count() > MAX_USERNAME_LEN {
        return ParseResult::failure(vec![ParseError::structural(
            line,
            PROFILE_COLUMN_USERNAME,
            username,
            "Username is too long (max 255 characters)",
        )]);
    }

    let mut favorite_films: Vec<FavoriteFilm> = cell(&record, &header_map, COL_FAVORITE_FILMS)
        .split(',')
        .filter_map(non_empty)
        .map(FavoriteFilm::from_uri)
        .collect();
    if favorite_films.len() > MAX_FAVORITE_FILMS {
        warn!(
            count = favorite_films.len(),
            max = MAX_FAVORITE_FILMS,
            "Profile lists too many favorite films, keeping the first {}",
            MAX_FAVORITE_FILMS
        );
        favorite_films.truncate(MAX_FAVORITE_FILMS);
    }

    let profile = UserProfile {
        username,
        first_name: non_empty(cell(&record, &header_map, COL_GIVEN_NAME)),
        last_name: non_empty(cell(&record, &header_map, COL_FAMILY_NAME)),
        email: non_empty(cell(&record, &header_map, COL_EMAIL)),
        location: non_empty(cell(&record, &header_map, COL_LOCATION)),
        website: non_empty(cell(&record, &header_map, COL_WEBSITE)),
        bio: non_empty(cell(&record, &header_map, COL_BIO)),
        pronoun: non_empty(cell(&record, &header_map, COL_PRONOUN)),
        join_date: parse_date(cell(&record, &header_map, COL_DATE_JOINED)),
        favorite_films,
    };

    debug!(
        username = %profile.username,
        favorites = profile.favorite_films.len(),
        has_join_date = profile.join_date.is_some(),
        "Parsed profile"
    );
    ParseResult::ok(profile, Vec::new())
}
