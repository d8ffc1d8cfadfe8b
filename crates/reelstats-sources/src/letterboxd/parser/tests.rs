use super::*;
use crate::letterboxd::export::{MemoryExport, PathExport};
use async_trait::async_trait;
use chrono::NaiveDate;
use reelstats_models::ErrorKind;
use std::io::Write;
use tempfile::TempDir;

use crate::error::SourceError;

const WATCHED_CSV: &str = "Date,Name,Year,Letterboxd URI
2022-01-20,Inception,2010,https://boxd.it/1skk
2022-01-22,The Dark Knight,2008,https://boxd.it/2b0k
2022-02-04,The Shawshank Redemption,1994,https://boxd.it/2aHi
";

const DIARY_CSV: &str = "Date,Name,Year,Letterboxd URI,Rating,Rewatch,Tags,Watched Date
2022-01-21,Inception,2010,https://boxd.it/1skk,5,,\"sci-fi, favorites\",2022-01-20
2023-06-02,Inception,2010,https://boxd.it/1skk,4.5,Yes,,2023-06-01
2022-01-23,The Dark Knight,2008,https://boxd.it/2b0k,,,,
";

const RATINGS_CSV: &str = "Date,Name,Year,Letterboxd URI,Rating
2022-03-01,The Dark Knight,2008,https://boxd.it/2b0k,4.5
";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn write_export(dir: &TempDir, name: &str, content: &str) -> PathExport {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}", content).unwrap();
    PathExport::new(path)
}

#[test]
fn test_parse_watched_csv() {
    let result = parse_csv_content(WATCHED_CSV, CsvType::Watched);

    assert!(result.is_clean());
    let movies = result.data.unwrap();
    assert_eq!(movies.len(), 3);
    assert_eq!(movies[0].id, "https://boxd.it/1skk");
    assert_eq!(movies[0].title, "Inception");
    assert_eq!(movies[0].year, 2010);
    assert_eq!(movies[0].date_marked_watched, date("2022-01-20"));
    assert_eq!(movies[0].watched_date, None);
    assert_eq!(movies[0].rewatch_count, 1);
    assert!(!movies[0].liked);
    assert_eq!(movies[2].decade(), 1990);
}

#[test]
fn test_parse_diary_csv() {
    let result = parse_csv_content(DIARY_CSV, CsvType::Diary);

    assert!(result.is_clean());
    let movies = result.data.unwrap();
    assert_eq!(movies.len(), 3);

    let first = &movies[0];
    assert_eq!(first.watched_date, Some(date("2022-01-20")));
    assert_eq!(first.date_marked_watched, date("2022-01-21"));
    assert_eq!(first.rating, Some(5.0));
    assert_eq!(first.rating_date, Some(date("2022-01-21")));
    assert!(!first.rewatch);
    assert!(first.has_tag("sci-fi"));
    assert!(first.has_tag("favorites"));

    assert!(movies[1].rewatch);
    assert_eq!(movies[1].rating, Some(4.5));

    // No rating and no Watched Date: falls back to Date, rating absent
    let dark_knight = &movies[2];
    assert_eq!(dark_knight.watched_date, Some(date("2022-01-23")));
    assert_eq!(dark_knight.rating, None);
    assert_eq!(dark_knight.rating_date, None);
    assert!(dark_knight.tags.is_empty());
}

#[test]
fn test_diary_out_of_range_rating_is_absent() {
    let csv = "Date,Name,Year,Letterboxd URI,Rating,Rewatch,Tags,Watched Date
2022-01-21,Inception,2010,https://boxd.it/1skk,7,,,2022-01-20
";
    let result = parse_csv_content(csv, CsvType::Diary);
    assert!(result.is_clean());
    assert_eq!(result.data.unwrap()[0].rating, None);
}

#[test]
fn test_diary_without_any_date_is_row_error() {
    let csv = "Date,Name,Year,Letterboxd URI,Rating,Rewatch,Tags,Watched Date
not-a-date,Inception,2010,https://boxd.it/1skk,4,,,
";
    let result = parse_csv_content(csv, CsvType::Diary);
    assert!(result.success);
    assert!(result.data.unwrap().is_empty());
    assert_eq!(result.errors[0].field, "Watched Date");
    assert_eq!(result.errors[0].kind, ErrorKind::Row);
}

#[test]
fn test_parse_ratings_csv() {
    let result = parse_csv_content(RATINGS_CSV, CsvType::Ratings);

    assert!(result.is_clean());
    let movies = result.data.unwrap();
    assert_eq!(movies[0].rating, Some(4.5));
    assert_eq!(movies[0].rating_date, Some(date("2022-03-01")));
    assert_eq!(movies[0].date_marked_watched, date("2022-03-01"));
}

#[test]
fn test_ratings_requires_rating() {
    let csv = "Date,Name,Year,Letterboxd URI,Rating
2022-03-01,The Dark Knight,2008,https://boxd.it/2b0k,
2022-03-02,Inception,2010,https://boxd.it/1skk,9
2022-03-03,Heat,1995,https://boxd.it/2aHk,4
";
    let result = parse_csv_content(csv, CsvType::Ratings);

    assert!(result.success);
    assert_eq!(result.data.as_ref().unwrap().len(), 1);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors.iter().all(|e| e.field == "Rating"));
    assert_eq!(result.errors[0].row, 2);
    assert_eq!(result.errors[1].row, 3);
}

#[test]
fn test_films_are_liked() {
    let result = parse_csv_content(WATCHED_CSV, CsvType::Films);
    assert!(result.data.unwrap().iter().all(|m| m.liked));
}

#[test]
fn test_malformed_rows_are_skipped_and_reported() {
    let csv = "Date,Name,Year,Letterboxd URI
2022-01-20,Inception,2010,https://boxd.it/1skk
2022-01-21,,2008,https://boxd.it/2b0k
2022-01-22,Metropolis,1850,https://boxd.it/2a9q
2022-01-23,Heat,1995,https://letterboxd.com/film/heat/
01/24/2022,Alien,1979,https://boxd.it/2aJg
2022-01-25,Aliens,1986,https://boxd.it/2aJk
";
    let result = parse_csv_content(csv, CsvType::Watched);

    assert!(result.success);
    assert!(!result.is_clean());
    let titles: Vec<String> = result.data.unwrap().into_iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["Inception", "Aliens"]);

    let fields: Vec<(usize, &str)> = result.errors.iter().map(|e| (e.row, e.field.as_str())).collect();
    assert_eq!(
        fields,
        vec![(3, "Name"), (4, "Year"), (5, "Letterboxd URI"), (6, "Date")]
    );
    assert_eq!(result.errors[1].value, "1850");
}

#[test]
fn test_empty_content_is_structural_failure() {
    for content in ["", "   \n  "] {
        let result = parse_csv_content(content, CsvType::Watched);
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.errors[0].kind, ErrorKind::Structural);
        assert_eq!(result.errors[0].message, "CSV file is empty");
    }
}

#[test]
fn test_header_only_yields_zero_movies() {
    let result = parse_csv_content("Date,Name,Year,Letterboxd URI\n", CsvType::Watched);
    assert!(result.is_clean());
    assert!(result.data.unwrap().is_empty());
}

#[test]
fn test_missing_required_column_fails_file() {
    let result = parse_csv_content("Date,Name,Year\n2022-01-20,Inception,2010\n", CsvType::Watched);

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].field, "Letterboxd URI");
    assert_eq!(result.errors[0].row, 1);
}

#[test]
fn test_diary_type_requires_diary_columns() {
    let result = parse_csv_content(WATCHED_CSV, CsvType::Diary);
    assert!(!result.success);
    assert_eq!(result.errors.len(), 4);
}

#[test]
fn test_unknown_type_is_detected_from_headers() {
    let result = parse_csv_content(RATINGS_CSV, CsvType::Unknown);
    assert_eq!(result.data.unwrap()[0].rating, Some(4.5));

    let result = parse_csv_content("Title,Year\nHeat,1995\n", CsvType::Unknown);
    assert!(!result.success);
    assert_eq!(result.errors[0].field, "headers");
}

#[test]
fn test_padded_headers_and_bom() {
    let csv = "\u{feff} Date , Name ,Year,  Letterboxd URI \n2022-01-20, Inception ,2010,https://boxd.it/1skk\n";
    let result = parse_csv_content(csv, CsvType::Unknown);

    assert!(result.is_clean());
    assert_eq!(result.data.unwrap()[0].title, "Inception");
}

#[test]
fn test_n_valid_rows_yield_n_movies() {
    let mut csv = String::from("Date,Name,Year,Letterboxd URI\n");
    for i in 0..250 {
        csv.push_str(&format!("2021-05-01,Film {},{},https://boxd.it/f{}\n", i, 1900 + (i % 120), i));
    }
    let result = parse_csv_content(&csv, CsvType::Watched);

    assert!(result.errors.is_empty());
    assert_eq!(result.data.unwrap().len(), 250);
}

#[test]
fn test_quoted_title_with_comma() {
    let csv = "Date,Name,Year,Letterboxd URI
2022-05-01,\"Crouching Tiger, Hidden Dragon\",2000,https://boxd.it/1Z8O
";
    let movies = parse_csv_content(csv, CsvType::Watched).data.unwrap();
    assert_eq!(movies[0].title, "Crouching Tiger, Hidden Dragon");
}

#[tokio::test]
async fn test_parse_letterboxd_csv_from_disk() {
    let dir = TempDir::new().unwrap();
    let file = write_export(&dir, "diary.csv", DIARY_CSV);

    let result = parse_letterboxd_csv(Some(&file)).await;
    assert!(result.is_clean());
    assert_eq!(result.data.unwrap().len(), 3);
}

#[tokio::test]
async fn test_parse_letterboxd_csv_detects_renamed_file() {
    let file = MemoryExport::new("letterboxd-ratings-2024.csv", RATINGS_CSV);
    let result = parse_letterboxd_csv(Some(&file)).await;
    assert_eq!(result.data.unwrap()[0].rating, Some(4.5));
}

#[tokio::test]
async fn test_file_name_wins_over_headers() {
    // films.csv has the base shape; the name says every row is liked
    let file = MemoryExport::new("films.csv", WATCHED_CSV);
    let result = parse_letterboxd_csv(Some(&file)).await;
    assert!(result.data.unwrap().iter().all(|m| m.liked));
}

#[tokio::test]
async fn test_no_file_is_structural_failure() {
    let result = parse_letterboxd_csv(None).await;
    assert!(!result.success);
    assert_eq!(result.errors[0].field, "file");
    assert_eq!(result.errors[0].message, "No file provided");
}

#[tokio::test]
async fn test_missing_file_on_disk_is_structural_failure() {
    let dir = TempDir::new().unwrap();
    let file = PathExport::new(dir.path().join("watched.csv"));

    let result = parse_letterboxd_csv(Some(&file)).await;
    assert!(!result.success);
    assert_eq!(result.errors[0].value, "watched.csv");
    assert!(result.errors[0].message.starts_with("File reading error"));
}

#[tokio::test]
async fn test_unrecognized_file_fails() {
    let file = MemoryExport::new("notes.csv", "a,b,c\n1,2,3\n");
    let result = parse_letterboxd_csv(Some(&file)).await;
    assert!(!result.success);
    assert_eq!(result.errors[0].field, "headers");
}

struct StalledExport;

#[async_trait]
impl ExportFile for StalledExport {
    fn name(&self) -> &str {
        "watched.csv"
    }

    async fn read_to_string(&self) -> Result<String, SourceError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(String::new())
    }
}

#[tokio::test]
async fn test_slow_read_times_out() {
    let result = parse_letterboxd_csv_with_timeout(Some(&StalledExport), Duration::from_millis(20)).await;
    assert!(!result.success);
    assert!(result.errors[0].message.contains("timed out"));
}
