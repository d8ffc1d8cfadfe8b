use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One film as known to the user, unified across every export it appears in.
///
/// `decade` and `era` are derived from `year` on demand and never stored,
/// so they cannot drift from the release year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: String, // Letterboxd URI (https://boxd.it/XXX)
    pub title: String,
    pub year: i32, // Release year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_date: Option<NaiveDate>, // First viewing, diary-accurate when available
    pub date_marked_watched: NaiveDate, // Fallback when no diary date exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>, // 0.5-5.0 in half-star steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_date: Option<NaiveDate>,
    pub rewatch: bool,
    pub rewatch_count: u32, // Total viewings, 1 = single watch
    #[serde(default)]
    pub rewatch_dates: Vec<NaiveDate>, // One entry per viewing beyond the first, chronological
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub liked: bool,
}

impl Movie {
    /// Create a single-watch movie with no rating, tags or like
    pub fn new(id: impl Into<String>, title: impl Into<String>, year: i32, date_marked_watched: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year,
            watched_date: None,
            date_marked_watched,
            rating: None,
            rating_date: None,
            rewatch: false,
            rewatch_count: 1,
            rewatch_dates: Vec::new(),
            tags: BTreeSet::new(),
            liked: false,
        }
    }

    /// Release decade, e.g. 1990 for 1994
    pub fn decade(&self) -> i32 {
        self.year.div_euclid(10) * 10
    }

    pub fn era(&self) -> Era {
        Era::from_year(self.year)
    }

    /// Best known date of the first viewing
    pub fn effective_watch_date(&self) -> NaiveDate {
        self.watched_date.unwrap_or(self.date_marked_watched)
    }

    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Release-year era used by the data model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Era {
    Classic,      // before 1960
    Golden,       // 1960-1979
    Modern,       // 1980-1999
    Contemporary, // 2000 onwards
}

impl Era {
    pub const ALL: [Era; 4] = [Era::Classic, Era::Golden, Era::Modern, Era::Contemporary];

    pub fn from_year(year: i32) -> Self {
        match year {
            y if y < 1960 => Era::Classic,
            y if y < 1980 => Era::Golden,
            y if y < 2000 => Era::Modern,
            _ => Era::Contemporary,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Era::Classic => "classic",
            Era::Golden => "golden",
            Era::Modern => "modern",
            Era::Contemporary => "contemporary",
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
