use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Letterboxd shows at most four favorite films on a profile
pub const MAX_FAVORITE_FILMS: usize = 4;

/// Account details from the profile export
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronoun: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    #[serde(default)]
    pub favorite_films: Vec<FavoriteFilm>, // Capped at MAX_FAVORITE_FILMS
}

impl UserProfile {
    /// Display name: "First Last", whichever half exists, or the username
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name.trim().to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

/// A favorite film reference. Only `uri` comes from the export; the rest is
/// filled in from the watched set when resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteFilm {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
}

impl FavoriteFilm {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            title: None,
            rating: None,
            watched: None,
        }
    }
}
