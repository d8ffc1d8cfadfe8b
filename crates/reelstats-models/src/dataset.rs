use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::movie::Movie;
use crate::profile::UserProfile;

/// Canonical merge output. Replaced wholesale on every merge, never patched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDataset {
    pub watched: Vec<Movie>,   // No duplicate ids
    pub watchlist: Vec<Movie>, // No duplicate ids, never overlaps `watched`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
    pub uploaded_files: BTreeSet<String>, // Export roles that contributed (watched, diary, ...)
    pub last_updated: DateTime<Utc>,
}

impl MovieDataset {
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty() && self.watchlist.is_empty()
    }

    pub fn total_movies(&self) -> usize {
        self.watched.len()
    }

    pub fn find_watched(&self, id: &str) -> Option<&Movie> {
        self.watched.iter().find(|m| m.id == id)
    }
}
