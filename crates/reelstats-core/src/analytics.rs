//! Descriptive statistics over a canonical watched set.
//!
//! Everything here is a pure function of the movie slice. An empty slice
//! yields zeroed numbers and empty maps.

use chrono::{Datelike, NaiveDate};
use reelstats_models::{Era, Movie};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round_to(part as f64 / whole as f64 * 100.0, 1)
    }
}

fn ratings(movies: &[Movie]) -> Vec<f64> {
    movies.iter().filter_map(|m| m.rating).collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_movies_watched: usize,
    pub movies_rated: usize,
    pub movies_liked: usize,
    pub rating_coverage: f64, // % of watched that are rated
    pub like_ratio: f64,      // % of watched that are liked
    pub average_rating: f64,
    pub median_rating: f64,
}

pub fn compute_overview_stats(movies: &[Movie]) -> OverviewStats {
    let rated = ratings(movies);
    let liked = movies.iter().filter(|m| m.liked).count();

    OverviewStats {
        total_movies_watched: movies.len(),
        movies_rated: rated.len(),
        movies_liked: liked,
        rating_coverage: percent(rated.len(), movies.len()),
        like_ratio: percent(liked, movies.len()),
        average_rating: round_to(mean(&rated), 1),
        median_rating: round_to(median(&rated), 1),
    }
}

/// Bucket layout for the rating distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 5.0,
            step: 0.5,
        }
    }
}

impl RatingScale {
    /// Finite bounds, `min <= max` and a positive step
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.step.is_finite()
            && self.step > 0.0
            && self.min <= self.max
    }

    /// Nearest bucket for a rating, clamped into range
    fn bucket(&self, rating: f64) -> f64 {
        let steps = ((rating - self.min) / self.step).round().max(0.0);
        (self.min + steps * self.step).min(self.max)
    }
}

/// Rated movies per half-star bucket ("0.5" .. "5.0"); empty buckets omitted
pub fn compute_rating_distribution(movies: &[Movie]) -> BTreeMap<String, usize> {
    compute_rating_distribution_with_scale(movies, &RatingScale::default())
}

/// Empty for a scale that fails [`RatingScale::is_valid`]
pub fn compute_rating_distribution_with_scale(movies: &[Movie], scale: &RatingScale) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    if !scale.is_valid() {
        warn!(?scale, "Invalid rating scale, skipping distribution");
        return distribution;
    }
    for rating in movies.iter().filter_map(|m| m.rating) {
        *distribution.entry(format!("{:.1}", scale.bucket(rating))).or_insert(0) += 1;
    }
    distribution
}

fn count_by<K: Ord>(movies: &[Movie], key: impl Fn(&Movie) -> K) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for movie in movies {
        *counts.entry(key(movie)).or_insert(0) += 1;
    }
    counts
}

/// Watched movies per release decade (1990, 2000, ...)
pub fn compute_decade_breakdown(movies: &[Movie]) -> BTreeMap<i32, usize> {
    count_by(movies, Movie::decade)
}

/// Watched movies per release year. For "when did I watch it" see
/// [`compute_watch_years`].
pub fn compute_yearly_watching(movies: &[Movie]) -> BTreeMap<i32, usize> {
    count_by(movies, |m| m.year)
}

/// Watched movies per calendar year of the first viewing
pub fn compute_watch_years(movies: &[Movie]) -> BTreeMap<i32, usize> {
    count_by(movies, |m| m.effective_watch_date().year())
}

pub fn compute_era_breakdown(movies: &[Movie]) -> BTreeMap<Era, usize> {
    count_by(movies, Movie::era)
}

pub fn compute_liked_by_decade(movies: &[Movie]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for movie in movies.iter().filter(|m| m.liked) {
        *counts.entry(movie.decade()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewatchStats {
    /// Viewings beyond the first, summed over rewatched movies
    pub total_rewatches: u32,
    pub movies_rewatched: usize,
    pub rewatch_rate: f64, // % of watched movies
}

pub fn compute_rewatch_stats(movies: &[Movie]) -> RewatchStats {
    let rewatched: Vec<&Movie> = movies.iter().filter(|m| m.rewatch).collect();
    // A lone diary entry marked as a rewatch still counts as one rewatch
    let total_rewatches = rewatched
        .iter()
        .map(|m| m.rewatch_count.saturating_sub(1).max(1))
        .sum();

    RewatchStats {
        total_rewatches,
        movies_rewatched: rewatched.len(),
        rewatch_rate: percent(rewatched.len(), movies.len()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<NaiveDate>,
    pub days: i64,
}

/// First and last viewing across the set, by effective watch date
pub fn compute_time_span(movies: &[Movie]) -> TimeSpan {
    let dates = movies.iter().map(Movie::effective_watch_date);
    let (earliest, latest) = dates.fold((None, None), |(lo, hi): (Option<NaiveDate>, Option<NaiveDate>), d| {
        (
            Some(lo.map_or(d, |lo| lo.min(d))),
            Some(hi.map_or(d, |hi| hi.max(d))),
        )
    });

    match (earliest, latest) {
        (Some(earliest), Some(latest)) => TimeSpan {
            earliest: Some(earliest),
            latest: Some(latest),
            days: (latest - earliest).num_days(),
        },
        _ => TimeSpan::default(),
    }
}

/// Stable secondary order: earliest viewing first, then id
fn watch_order(a: &Movie, b: &Movie) -> Ordering {
    a.effective_watch_date()
        .cmp(&b.effective_watch_date())
        .then_with(|| a.id.cmp(&b.id))
}

/// Highest rated first
pub fn top_movies_by_rating(movies: &[Movie], limit: usize) -> Vec<&Movie> {
    let mut rated: Vec<&Movie> = movies.iter().filter(|m| m.rating.is_some()).collect();
    rated.sort_by(|a, b| {
        let (ra, rb) = (a.rating.unwrap_or(0.0), b.rating.unwrap_or(0.0));
        rb.total_cmp(&ra).then_with(|| watch_order(a, b))
    });
    rated.truncate(limit);
    rated
}

/// Most viewings first
pub fn top_rewatched_movies(movies: &[Movie], limit: usize) -> Vec<&Movie> {
    let mut rewatched: Vec<&Movie> = movies.iter().filter(|m| m.rewatch).collect();
    rewatched.sort_by(|a, b| {
        b.rewatch_count
            .cmp(&a.rewatch_count)
            .then_with(|| watch_order(a, b))
    });
    rewatched.truncate(limit);
    rewatched
}

/// Movies first watched in a calendar year
pub fn movies_watched_in_year(movies: &[Movie], year: i32) -> Vec<&Movie> {
    movies
        .iter()
        .filter(|m| m.effective_watch_date().year() == year)
        .collect()
}

pub fn movies_by_release_year(movies: &[Movie], year: i32) -> Vec<&Movie> {
    movies.iter().filter(|m| m.year == year).collect()
}

pub fn movies_by_decade(movies: &[Movie], decade: i32) -> Vec<&Movie> {
    movies.iter().filter(|m| m.decade() == decade).collect()
}

pub fn movies_by_rating(movies: &[Movie], rating: f64) -> Vec<&Movie> {
    movies.iter().filter(|m| m.rating == Some(rating)).collect()
}

pub fn movies_with_tag<'a>(movies: &'a [Movie], tag: &str) -> Vec<&'a Movie> {
    movies.iter().filter(|m| m.has_tag(tag)).collect()
}

pub fn tagged_movies(movies: &[Movie]) -> Vec<&Movie> {
    movies.iter().filter(|m| !m.tags.is_empty()).collect()
}

pub fn liked_movies(movies: &[Movie]) -> Vec<&Movie> {
    movies.iter().filter(|m| m.liked).collect()
}

pub fn unrated_movies(movies: &[Movie]) -> Vec<&Movie> {
    movies.iter().filter(|m| m.rating.is_none()).collect()
}

pub fn compute_tag_distribution(movies: &[Movie]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in movies.iter().flat_map(|m| m.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: usize,
}

fn aggregate_ratings<K: Ord>(movies: &[Movie], key: impl Fn(&Movie) -> K) -> BTreeMap<K, RatingAggregate> {
    let mut sums: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for movie in movies {
        if let Some(rating) = movie.rating {
            let entry = sums.entry(key(movie)).or_insert((0.0, 0));
            entry.0 += rating;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(k, (sum, count))| {
            (
                k,
                RatingAggregate {
                    average: round_to(sum / count as f64, 1),
                    count,
                },
            )
        })
        .collect()
}

/// Average rating per release decade; decades without ratings omitted
pub fn ratings_by_decade(movies: &[Movie]) -> BTreeMap<i32, RatingAggregate> {
    aggregate_ratings(movies, Movie::decade)
}

/// Average rating per calendar year of the first viewing
pub fn ratings_by_watch_year(movies: &[Movie]) -> BTreeMap<i32, RatingAggregate> {
    aggregate_ratings(movies, |m| m.effective_watch_date().year())
}

/// Movies per day across the tracked span, 3 decimals; 0 for a span under a day
pub fn compute_viewing_velocity(movies: &[Movie]) -> f64 {
    let span = compute_time_span(movies);
    if span.days <= 0 {
        return 0.0;
    }
    round_to(movies.len() as f64 / span.days as f64, 3)
}

/// Population standard deviation of ratings, 2 decimals
pub fn compute_rating_consistency(movies: &[Movie]) -> f64 {
    let rated = ratings(movies);
    if rated.is_empty() {
        return 0.0;
    }
    let avg = mean(&rated);
    let variance = rated.iter().map(|r| (r - avg).powi(2)).sum::<f64>() / rated.len() as f64;
    round_to(variance.sqrt(), 2)
}

/// The full statistics bundle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalyticsOverview {
    pub total_movies_watched: usize,
    pub movies_rated: usize,
    pub movies_liked: usize,
    pub rating_coverage: f64,
    pub like_ratio: f64,
    pub average_rating: f64,
    pub median_rating: f64,
    pub rating_distribution: BTreeMap<String, usize>,
    pub total_rewatches: u32,
    pub movies_rewatched: usize,
    pub rewatch_rate: f64,
    pub time_span: TimeSpan,
    pub decade_breakdown: BTreeMap<i32, usize>,
    pub yearly_watching: BTreeMap<i32, usize>,
    pub era_breakdown: BTreeMap<Era, usize>,
    pub liked_by_decade: BTreeMap<i32, usize>,
}

pub fn compute_analytics(movies: &[Movie]) -> AnalyticsOverview {
    let overview = compute_overview_stats(movies);
    let rewatches = compute_rewatch_stats(movies);

    let analytics = AnalyticsOverview {
        total_movies_watched: overview.total_movies_watched,
        movies_rated: overview.movies_rated,
        movies_liked: overview.movies_liked,
        rating_coverage: overview.rating_coverage,
        like_ratio: overview.like_ratio,
        average_rating: overview.average_rating,
        median_rating: overview.median_rating,
        rating_distribution: compute_rating_distribution(movies),
        total_rewatches: rewatches.total_rewatches,
        movies_rewatched: rewatches.movies_rewatched,
        rewatch_rate: rewatches.rewatch_rate,
        time_span: compute_time_span(movies),
        decade_breakdown: compute_decade_breakdown(movies),
        yearly_watching: compute_yearly_watching(movies),
        era_breakdown: compute_era_breakdown(movies),
        liked_by_decade: compute_liked_by_decade(movies),
    };

    debug!(
        movies = analytics.total_movies_watched,
        rated = analytics.movies_rated,
        decades = analytics.decade_breakdown.len(),
        "Computed analytics"
    );
    analytics
}
