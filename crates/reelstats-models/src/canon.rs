use serde::{Deserialize, Serialize};

use crate::movie::Movie;

/// A single entry of a curated list. Title and year are all we match on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CanonMovie {
    pub title: String,
    pub year: i32,
}

impl CanonMovie {
    pub fn new(title: impl Into<String>, year: i32) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }
}

/// A curated reference list (e.g. a "top 250")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonList {
    pub id: String,          // e.g. "imdb_top_250"
    pub title: String,       // Full title
    pub short_title: String, // For narrow displays
    pub source_url: String,
    pub movies: Vec<CanonMovie>,
}

impl CanonList {
    pub fn total_movies(&self) -> usize {
        self.movies.len()
    }
}

/// User's progress through one canon list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonProgress {
    pub list_id: String,
    pub list_title: String,
    pub total_movies: usize,
    pub watched_count: usize,
    pub completion_percentage: f64, // 0-100, one decimal
    pub watched_movies: Vec<Movie>,
    pub unwatched_movies: Vec<CanonMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonOverallStats {
    pub total_lists: usize,
    pub average_completion: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_completed: Option<String>, // list id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub least_completed: Option<String>, // list id
}

/// Progress across several lists, highest completion first
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonComparison {
    pub lists: Vec<CanonProgress>,
    pub overall_stats: CanonOverallStats,
}

/// How a user movie picks its reference entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Accept the first reference entry that matches, in list order
    #[default]
    FirstMatch,
    /// Accept the matching reference entry with the highest title similarity
    BestMatch,
}
