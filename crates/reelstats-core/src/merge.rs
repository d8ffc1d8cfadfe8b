//! Source merge engine.
//!
//! The watched log is the roster: it decides which movies exist. Every other
//! export contributes a fixed set of fields, applied in ascending precedence
//! (films < watched < diary < ratings). A contribution only overwrites the
//! fields it actually supplies, so a ratings row never clears diary tags.

use chrono::{DateTime, Utc};
use reelstats_models::{FavoriteFilm, Movie, MovieDataset, UserProfile};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("a watched export is required to build a dataset")]
    MissingWatched,
}

/// Export roles that contribute movie fields, in ascending precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceRole {
    Films,
    Watched,
    Diary,
    Ratings,
}

/// Movie fields a source role can own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieField {
    Title,
    Year,
    WatchedDate,
    DateMarkedWatched,
    Rating,      // rating + rating_date
    Rewatch,     // rewatch flag, count and dates
    Tags,
    Liked,
}

impl SourceRole {
    /// Contribution order, lowest precedence first
    pub const PRECEDENCE: [SourceRole; 4] = [
        SourceRole::Films,
        SourceRole::Watched,
        SourceRole::Diary,
        SourceRole::Ratings,
    ];

    pub fn fields(&self) -> &'static [MovieField] {
        match self {
            SourceRole::Films => &[MovieField::Liked],
            SourceRole::Watched => &[MovieField::Title, MovieField::Year, MovieField::DateMarkedWatched],
            SourceRole::Diary => &[
                MovieField::WatchedDate,
                MovieField::DateMarkedWatched,
                MovieField::Rating,
                MovieField::Rewatch,
                MovieField::Tags,
            ],
            SourceRole::Ratings => &[MovieField::Rating],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceRole::Films => "films",
            SourceRole::Watched => "watched",
            SourceRole::Diary => "diary",
            SourceRole::Ratings => "ratings",
        }
    }
}

/// Parsed record sets handed to the merge. `None` means "not supplied".
#[derive(Debug, Clone, Default)]
pub struct MergeSources {
    pub watched: Option<Vec<Movie>>,
    pub diary: Option<Vec<Movie>>,
    pub ratings: Option<Vec<Movie>>,
    pub films: Option<Vec<Movie>>,
    pub watchlist: Option<Vec<Movie>>,
    pub profile: Option<UserProfile>,
}

impl MergeSources {
    /// Roles present, as recorded in `MovieDataset::uploaded_files`
    pub fn supplied(&self) -> BTreeSet<String> {
        [
            ("watched", self.watched.is_some()),
            ("diary", self.diary.is_some()),
            ("ratings", self.ratings.is_some()),
            ("films", self.films.is_some()),
            ("watchlist", self.watchlist.is_some()),
            ("profile", self.profile.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Copy the fields `role` owns from `incoming` onto `existing`.
///
/// Fields the incoming record does not carry (an absent rating, an empty tag
/// set) leave the existing value alone.
pub fn resolve_conflicts(existing: &Movie, incoming: &Movie, role: SourceRole) -> Movie {
    let mut merged = existing.clone();
    apply_fields(&mut merged, incoming, role);
    merged
}

fn apply_fields(target: &mut Movie, incoming: &Movie, role: SourceRole) {
    for field in role.fields() {
        match field {
            MovieField::Title => {
                if !incoming.title.trim().is_empty() {
                    target.title = incoming.title.clone();
                }
            }
            MovieField::Year => target.year = incoming.year,
            MovieField::WatchedDate => {
                if incoming.watched_date.is_some() {
                    target.watched_date = incoming.watched_date;
                }
            }
            MovieField::DateMarkedWatched => target.date_marked_watched = incoming.date_marked_watched,
            MovieField::Rating => {
                if incoming.rating.is_some() {
                    target.rating = incoming.rating;
                    target.rating_date = incoming.rating_date;
                }
            }
            MovieField::Rewatch => {
                target.rewatch = target.rewatch || incoming.rewatch;
                if incoming.rewatch_count > target.rewatch_count || !incoming.rewatch_dates.is_empty() {
                    target.rewatch_count = incoming.rewatch_count;
                    target.rewatch_dates = incoming.rewatch_dates.clone();
                }
            }
            MovieField::Tags => {
                if !incoming.tags.is_empty() {
                    target.tags = incoming.tags.clone();
                }
            }
            MovieField::Liked => target.liked = target.liked || incoming.liked,
        }
    }
}

/// Populated optional fields, used to pick between duplicates
fn completeness(movie: &Movie) -> usize {
    [
        movie.watched_date.is_some(),
        movie.rating.is_some(),
        movie.rating_date.is_some(),
        movie.rewatch,
        !movie.tags.is_empty(),
        movie.liked,
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

/// One record per id: the most complete one, at the position of the id's
/// first occurrence. Ties keep the earlier record.
pub fn deduplicate_movies(movies: &[Movie]) -> Vec<Movie> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<Movie> = Vec::with_capacity(movies.len());
    let mut duplicates = 0;

    for movie in movies {
        match positions.get(movie.id.as_str()) {
            Some(&pos) => {
                duplicates += 1;
                if completeness(movie) > completeness(&unique[pos]) {
                    unique[pos] = movie.clone();
                }
            }
            None => {
                positions.insert(movie.id.as_str(), unique.len());
                unique.push(movie.clone());
            }
        }
    }

    if duplicates > 0 {
        debug!(input = movies.len(), unique = unique.len(), duplicates, "Removed duplicate movies");
    }
    unique
}

/// Collapse the diary entries of one movie into a single record.
///
/// The earliest viewing supplies the watch dates; every later viewing adds
/// its date to `rewatch_dates`. Tags are unioned, and the rating comes from
/// the most recent rated entry.
pub fn aggregate_rewatches(entries: &[Movie]) -> Option<Movie> {
    let mut ordered: Vec<&Movie> = entries.iter().collect();
    // Stable: same-day entries keep export order
    ordered.sort_by_key(|m| m.effective_watch_date());

    let (first, later) = ordered.split_first()?;
    let mut movie = (*first).clone();

    movie.rewatch_dates = later.iter().map(|m| m.effective_watch_date()).collect();
    movie.rewatch_count = ordered.len() as u32;
    movie.rewatch = movie.rewatch_count > 1 || ordered.iter().any(|m| m.rewatch);
    movie.tags = ordered.iter().flat_map(|m| m.tags.iter().cloned()).collect();
    movie.liked = ordered.iter().any(|m| m.liked);

    if let Some(latest_rated) = ordered.iter().rev().find(|m| m.rating.is_some()) {
        movie.rating = latest_rated.rating;
        movie.rating_date = latest_rated.rating_date;
    }

    Some(movie)
}

/// Identity fallback for rows whose URI differs from the watched log's
fn title_year_key(movie: &Movie) -> String {
    format!("{}|{}", movie.title.trim().to_lowercase(), movie.year)
}

/// The canonical watched set under construction
struct Roster {
    movies: Vec<Movie>,
    by_id: HashMap<String, usize>,
    by_title_year: HashMap<String, usize>,
}

impl Roster {
    fn seed(watched: Vec<Movie>) -> Self {
        let mut by_id = HashMap::with_capacity(watched.len());
        let mut by_title_year = HashMap::with_capacity(watched.len());
        for (idx, movie) in watched.iter().enumerate() {
            by_id.insert(movie.id.clone(), idx);
            by_title_year.entry(title_year_key(movie)).or_insert(idx);
        }
        Self {
            movies: watched,
            by_id,
            by_title_year,
        }
    }

    fn locate(&self, movie: &Movie) -> Option<usize> {
        self.by_id
            .get(&movie.id)
            .or_else(|| self.by_title_year.get(&title_year_key(movie)))
            .copied()
    }

    fn contains(&self, movie: &Movie) -> bool {
        self.locate(movie).is_some()
    }

    /// Apply one role's records; returns how many matched no roster movie
    fn apply(&mut self, role: SourceRole, records: &[Movie]) -> usize {
        let mut unmatched = 0;
        for record in records {
            match self.locate(record) {
                Some(idx) => apply_fields(&mut self.movies[idx], record, role),
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            debug!(role = role.as_str(), unmatched, "Skipped records not in the watched log");
        }
        unmatched
    }

    /// Group diary rows by roster movie, then aggregate each group
    fn apply_diary(&mut self, diary: &[Movie]) -> usize {
        let mut groups: Vec<(usize, Vec<Movie>)> = Vec::new();
        let mut group_of: HashMap<usize, usize> = HashMap::new();
        let mut unmatched = 0;

        for entry in diary {
            let Some(idx) = self.locate(entry) else {
                unmatched += 1;
                continue;
            };
            let slot = *group_of.entry(idx).or_insert_with(|| {
                groups.push((idx, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(entry.clone());
        }

        let mut rewatched = 0;
        for (idx, entries) in &groups {
            if let Some(aggregated) = aggregate_rewatches(entries) {
                if aggregated.rewatch_count > 1 {
                    rewatched += 1;
                }
                apply_fields(&mut self.movies[*idx], &aggregated, SourceRole::Diary);
            }
        }

        debug!(
            entries = diary.len(),
            movies = groups.len(),
            rewatched,
            unmatched,
            "Applied diary entries"
        );
        unmatched
    }
}

/// Build a dataset from freshly parsed exports
pub fn merge_movie_sources(sources: &MergeSources) -> Result<MovieDataset, MergeError> {
    merge_at(sources, Utc::now())
}

pub(crate) fn merge_at(sources: &MergeSources, now: DateTime<Utc>) -> Result<MovieDataset, MergeError> {
    let watched = sources.watched.as_deref().ok_or(MergeError::MissingWatched)?;
    let mut roster = Roster::seed(deduplicate_movies(watched));

    // Watched seeds the roster; the rest contribute in precedence order
    let mut unmatched = 0;
    for role in SourceRole::PRECEDENCE {
        unmatched += match role {
            SourceRole::Films => sources
                .films
                .as_deref()
                .map(|films| roster.apply(role, &deduplicate_movies(films)))
                .unwrap_or(0),
            SourceRole::Watched => 0,
            SourceRole::Diary => sources.diary.as_deref().map(|d| roster.apply_diary(d)).unwrap_or(0),
            SourceRole::Ratings => sources
                .ratings
                .as_deref()
                .map(|ratings| roster.apply(role, &deduplicate_movies(ratings)))
                .unwrap_or(0),
        };
    }

    let watchlist: Vec<Movie> = sources
        .watchlist
        .as_deref()
        .map(deduplicate_movies)
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !roster.contains(m))
        .collect();

    let dataset = MovieDataset {
        watched: roster.movies,
        watchlist,
        user_profile: sources.profile.clone(),
        uploaded_files: sources.supplied(),
        last_updated: now,
    };

    info!(
        watched = dataset.watched.len(),
        watchlist = dataset.watchlist.len(),
        rated = dataset.watched.iter().filter(|m| m.is_rated()).count(),
        unmatched,
        files = ?dataset.uploaded_files,
        "Merged movie sources"
    );
    Ok(dataset)
}

/// Re-merge with newly supplied exports.
///
/// New watched/watchlist/profile replace the current ones; when absent the
/// current ones are reused. Diary, ratings and films only apply when supplied
/// now; their earlier effect lives on in the current watched records.
pub fn update_dataset(current: &MovieDataset, incoming: &MergeSources) -> Result<MovieDataset, MergeError> {
    let sources = MergeSources {
        watched: Some(incoming.watched.clone().unwrap_or_else(|| current.watched.clone())),
        diary: incoming.diary.clone(),
        ratings: incoming.ratings.clone(),
        films: incoming.films.clone(),
        watchlist: incoming
            .watchlist
            .clone()
            .or_else(|| Some(current.watchlist.clone())),
        profile: incoming.profile.clone().or_else(|| current.user_profile.clone()),
    };

    let mut dataset = merge_movie_sources(&sources)?;
    dataset.uploaded_files = current
        .uploaded_files
        .iter()
        .cloned()
        .chain(incoming.supplied())
        .collect();
    Ok(dataset)
}

/// Favorite films filled in from the watched set
pub fn resolve_favorite_films(profile: &UserProfile, watched: &[Movie]) -> Vec<FavoriteFilm> {
    let by_id: HashMap<&str, &Movie> = watched.iter().map(|m| (m.id.as_str(), m)).collect();

    profile
        .favorite_films
        .iter()
        .map(|film| match by_id.get(film.uri.as_str()) {
            Some(movie) => FavoriteFilm {
                uri: film.uri.clone(),
                title: Some(movie.title.clone()),
                rating: movie.rating,
                watched: Some(true),
            },
            None => FavoriteFilm {
                watched: Some(false),
                ..film.clone()
            },
        })
        .collect()
}
