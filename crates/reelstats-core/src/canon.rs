//! Matching a watched set against curated reference lists.

use reelstats_models::{
    CanonComparison, CanonList, CanonMovie, CanonOverallStats, CanonProgress, MatchStrategy, Movie,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::analytics::round_to;

const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Years must be equal; when false they may differ by one
    pub exact_year_match: bool,
    /// Minimum bigram similarity for a non-exact title match
    pub similarity_threshold: f64,
    pub strategy: MatchStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            exact_year_match: true,
            similarity_threshold: 0.85,
            strategy: MatchStrategy::FirstMatch,
        }
    }
}

/// Lowercase, drop one leading article, strip punctuation, collapse spaces
pub fn normalize_title(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let without_article = LEADING_ARTICLES
        .iter()
        .find_map(|article| {
            lowered
                .strip_prefix(article)
                .filter(|rest| rest.starts_with(char::is_whitespace))
        })
        .unwrap_or(&lowered);

    let cleaned: String = without_article
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn titles_match(a: &str, b: &str) -> bool {
    normalize_title(a) == normalize_title(b)
}

/// Jaccard similarity of the character bigrams of both normalized titles
pub fn title_similarity(a: &str, b: &str) -> f64 {
    normalized_similarity(&normalize_title(a), &normalize_title(b))
}

fn bigrams(s: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let (left, right) = (bigrams(a), bigrams(b));
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

fn years_match(a: i32, b: i32, exact: bool) -> bool {
    if exact {
        a == b
    } else {
        (a - b).abs() <= 1
    }
}

/// Similarity when two normalized titles count as the same film
fn title_score(a: &str, b: &str, threshold: f64) -> Option<f64> {
    let score = normalized_similarity(a, b);
    (a == b || score >= threshold).then_some(score)
}

/// Whether a user movie is the reference entry
pub fn match_movie(user: &Movie, reference: &CanonMovie, options: &MatchOptions) -> bool {
    years_match(user.year, reference.year, options.exact_year_match)
        && title_score(
            &normalize_title(&user.title),
            &normalize_title(&reference.title),
            options.similarity_threshold,
        )
        .is_some()
}

struct Candidate<'a, T> {
    position: usize,
    item: &'a T,
    normalized: String,
}

/// Items bucketed by release year, normalized once
struct YearIndex<'a, T> {
    by_year: HashMap<i32, Vec<Candidate<'a, T>>>,
}

impl<'a, T> YearIndex<'a, T> {
    fn build(items: &'a [T], key: impl Fn(&T) -> (i32, &str)) -> Self {
        let mut by_year: HashMap<i32, Vec<Candidate<'a, T>>> = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            let (year, title) = key(item);
            by_year.entry(year).or_default().push(Candidate {
                position,
                item,
                normalized: normalize_title(title),
            });
        }
        Self { by_year }
    }

    /// Candidates whose year is compatible, in original order
    fn candidates(&self, year: i32, exact: bool) -> Vec<&Candidate<'a, T>> {
        let years: &[i32] = if exact { &[0] } else { &[-1, 0, 1] };
        let mut found: Vec<&Candidate<'a, T>> = years
            .iter()
            .filter_map(|offset| self.by_year.get(&(year + offset)))
            .flatten()
            .collect();
        if !exact {
            found.sort_by_key(|c| c.position);
        }
        found
    }
}

/// A user movie paired with the reference entry it was matched to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchPair<'a> {
    pub movie: &'a Movie,
    pub reference: &'a CanonMovie,
    pub similarity: f64,
}

/// Pair each user movie with at most one reference entry.
///
/// `FirstMatch` takes the first matching entry in list order. `BestMatch`
/// takes the most similar one, earliest entry on ties.
pub fn find_match_pairs<'a>(
    user_movies: &'a [Movie],
    reference: &'a [CanonMovie],
    options: &MatchOptions,
) -> Vec<MatchPair<'a>> {
    let index = YearIndex::build(reference, |m| (m.year, m.title.as_str()));
    let mut pairs = Vec::new();

    for movie in user_movies {
        let normalized = normalize_title(&movie.title);
        let mut scored = index
            .candidates(movie.year, options.exact_year_match)
            .into_iter()
            .filter_map(|c| title_score(&normalized, &c.normalized, options.similarity_threshold).map(|s| (c, s)));

        let chosen = match options.strategy {
            MatchStrategy::FirstMatch => scored.next(),
            MatchStrategy::BestMatch => {
                let mut best: Option<(&Candidate<'_, CanonMovie>, f64)> = None;
                for (candidate, score) in scored {
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((candidate, score));
                    }
                }
                best
            }
        };

        if let Some((candidate, similarity)) = chosen {
            pairs.push(MatchPair {
                movie,
                reference: candidate.item,
                similarity,
            });
        }
    }

    pairs
}

/// User movies that match some reference entry (first-match projection)
pub fn find_matched_movies(user_movies: &[Movie], reference: &[CanonMovie], options: &MatchOptions) -> Vec<Movie> {
    let options = MatchOptions {
        strategy: MatchStrategy::FirstMatch,
        ..*options
    };
    find_match_pairs(user_movies, reference, &options)
        .into_iter()
        .map(|pair| pair.movie.clone())
        .collect()
}

/// Reference entries no user movie matches, in list order
pub fn find_unwatched_movies(
    user_movies: &[Movie],
    reference: &[CanonMovie],
    options: &MatchOptions,
) -> Vec<CanonMovie> {
    let index = YearIndex::build(user_movies, |m| (m.year, m.title.as_str()));

    reference
        .iter()
        .filter(|entry| {
            let normalized = normalize_title(&entry.title);
            !index
                .candidates(entry.year, options.exact_year_match)
                .iter()
                .any(|c| title_score(&c.normalized, &normalized, options.similarity_threshold).is_some())
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    pub total_canon_movies: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub match_rate: f64, // percent, 0 when the list is empty
}

pub fn get_match_stats(user_movies: &[Movie], reference: &[CanonMovie], options: &MatchOptions) -> MatchStats {
    let matched_count = find_match_pairs(user_movies, reference, options).len();
    let total = reference.len();
    MatchStats {
        total_canon_movies: total,
        matched_count,
        unmatched_count: total.saturating_sub(matched_count),
        match_rate: if total == 0 {
            0.0
        } else {
            matched_count as f64 / total as f64 * 100.0
        },
    }
}

/// Progress through one list. `watched_count` counts covered list entries,
/// so completion never exceeds 100%.
pub fn calculate_list_progress(list: &CanonList, movies: &[Movie], options: &MatchOptions) -> CanonProgress {
    let watched_movies: Vec<Movie> = find_match_pairs(movies, &list.movies, options)
        .into_iter()
        .map(|pair| pair.movie.clone())
        .collect();
    let unwatched_movies = find_unwatched_movies(movies, &list.movies, options);

    let total_movies = list.total_movies();
    let watched_count = total_movies - unwatched_movies.len();
    let completion_percentage = if total_movies == 0 {
        0.0
    } else {
        round_to(watched_count as f64 / total_movies as f64 * 100.0, 1)
    };

    debug!(
        list = %list.id,
        total = total_movies,
        watched = watched_count,
        completion = completion_percentage,
        "Calculated canon list progress"
    );

    CanonProgress {
        list_id: list.id.clone(),
        list_title: list.title.clone(),
        total_movies,
        watched_count,
        completion_percentage,
        watched_movies,
        unwatched_movies,
    }
}

/// Progress on every list, most complete first
pub fn compare_canon_lists(lists: &[CanonList], movies: &[Movie], options: &MatchOptions) -> CanonComparison {
    let mut progress: Vec<CanonProgress> = lists
        .iter()
        .map(|list| calculate_list_progress(list, movies, options))
        .collect();
    progress.sort_by(|a, b| b.completion_percentage.total_cmp(&a.completion_percentage));

    let total_lists = progress.len();
    let average_completion = if total_lists == 0 {
        0.0
    } else {
        round_to(
            progress.iter().map(|p| p.completion_percentage).sum::<f64>() / total_lists as f64,
            1,
        )
    };

    CanonComparison {
        overall_stats: CanonOverallStats {
            total_lists,
            average_completion,
            most_completed: progress.first().map(|p| p.list_id.clone()),
            least_completed: progress.last().map(|p| p.list_id.clone()),
        },
        lists: progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn create_movie(title: &str, year: i32) -> Movie {
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let slug: String = title.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        Movie::new(format!("https://boxd.it/{}", slug), title, year, date)
    }

    fn create_list(id: &str, movies: &[(&str, i32)]) -> CanonList {
        CanonList {
            id: id.to_string(),
            title: format!("{} list", id),
            short_title: id.to_string(),
            source_url: format!("https://letterboxd.com/list/{}", id),
            movies: movies.iter().map(|(t, y)| CanonMovie::new(*t, *y)).collect(),
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Dark Knight"), "dark knight");
        assert_eq!(normalize_title("  A Clockwork Orange "), "clockwork orange");
        assert_eq!(normalize_title("Star Wars: Episode IV - A New Hope"), "star wars episode iv a new hope");
        assert_eq!(normalize_title("Them!"), "them");
        assert_eq!(normalize_title("Anatomy of a Fall"), "anatomy of a fall");
        assert_eq!(normalize_title("The"), "the");
    }

    #[test]
    fn test_titles_match_ignores_article_and_punctuation() {
        assert!(titles_match("The Godfather", "Godfather"));
        assert!(titles_match("Léon: The Professional", "Léon The Professional"));
        assert!(!titles_match("Alien", "Aliens"));
    }

    #[test]
    fn test_title_similarity_bounds() {
        assert_eq!(title_similarity("Inception", "inception"), 1.0);
        assert_eq!(title_similarity("M", "Z"), 0.0);
        let s = title_similarity("Alien", "Aliens");
        assert!(s > 0.5 && s < 1.0);
    }

    #[test]
    fn test_match_movie() {
        let options = MatchOptions::default();
        let user = create_movie("The Shawshank Redemption", 1994);

        assert!(match_movie(&user, &CanonMovie::new("Shawshank Redemption", 1994), &options));
        assert!(!match_movie(&user, &CanonMovie::new("The Shawshank Redemption", 1995), &options));
        assert!(!match_movie(&user, &CanonMovie::new("The Shawshank Redemption", 1992), &options));
    }

    #[test]
    fn test_match_movie_loose_year() {
        let options = MatchOptions {
            exact_year_match: false,
            ..MatchOptions::default()
        };
        let user = create_movie("Seven Samurai", 1954);

        assert!(match_movie(&user, &CanonMovie::new("Seven Samurai", 1955), &options));
        assert!(!match_movie(&user, &CanonMovie::new("Seven Samurai", 1956), &options));
    }

    #[test]
    fn test_fuzzy_threshold() {
        let user = create_movie("Dr. Strangelove or: How I Learned to Stop Worrying and Love the Bomb", 1964);
        let reference = CanonMovie::new("Dr Strangelove or How I Learned to Stop Worrying and Love the Bomb!", 1964);
        assert!(match_movie(&user, &reference, &MatchOptions::default()));

        let user = create_movie("Alien", 1979);
        let strict = MatchOptions::default();
        assert!(!match_movie(&user, &CanonMovie::new("Aliens", 1979), &strict));
    }

    #[test]
    fn test_first_match_is_greedy() {
        let reference = vec![CanonMovie::new("Halloween II", 1981), CanonMovie::new("Halloween", 1981)];
        let movies = vec![create_movie("Halloween", 1981)];
        let options = MatchOptions {
            similarity_threshold: 0.6,
            ..MatchOptions::default()
        };

        let pairs = find_match_pairs(&movies, &reference, &options);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].reference.title, "Halloween II");
    }

    #[test]
    fn test_best_match_prefers_most_similar() {
        let reference = vec![CanonMovie::new("Halloween II", 1981), CanonMovie::new("Halloween", 1981)];
        let movies = vec![create_movie("Halloween", 1981)];
        let options = MatchOptions {
            similarity_threshold: 0.6,
            strategy: MatchStrategy::BestMatch,
            ..MatchOptions::default()
        };

        let pairs = find_match_pairs(&movies, &reference, &options);
        assert_eq!(pairs[0].reference.title, "Halloween");
        assert_eq!(pairs[0].similarity, 1.0);
    }

    #[test]
    fn test_find_matched_and_unwatched() {
        let reference = vec![
            CanonMovie::new("The Godfather", 1972),
            CanonMovie::new("Casablanca", 1942),
            CanonMovie::new("Inception", 2010),
        ];
        let movies = vec![create_movie("Inception", 2010), create_movie("Godfather", 1972), create_movie("Heat", 1995)];
        let options = MatchOptions::default();

        let matched = find_matched_movies(&movies, &reference, &options);
        let titles: Vec<&str> = matched.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Inception", "Godfather"]);

        let unwatched = find_unwatched_movies(&movies, &reference, &options);
        assert_eq!(unwatched, vec![CanonMovie::new("Casablanca", 1942)]);
    }

    #[test]
    fn test_loose_year_candidates_keep_list_order() {
        let reference = vec![CanonMovie::new("Solaris", 1973), CanonMovie::new("Solaris", 1972)];
        let movies = vec![create_movie("Solaris", 1972)];
        let options = MatchOptions {
            exact_year_match: false,
            ..MatchOptions::default()
        };

        let pairs = find_match_pairs(&movies, &reference, &options);
        assert_eq!(pairs[0].reference.year, 1973);
    }

    #[test]
    fn test_match_stats() {
        let reference = vec![CanonMovie::new("Inception", 2010), CanonMovie::new("Heat", 1995)];
        let movies = vec![create_movie("Inception", 2010)];

        let stats = get_match_stats(&movies, &reference, &MatchOptions::default());
        assert_eq!(stats.matched_count, 1);
        assert_eq!(stats.unmatched_count, 1);
        assert_eq!(stats.match_rate, 50.0);

        let empty = get_match_stats(&movies, &[], &MatchOptions::default());
        assert_eq!(empty.match_rate, 0.0);
    }

    #[test]
    fn test_calculate_list_progress() {
        let list = create_list("top", &[("Inception", 2010), ("Heat", 1995), ("Alien", 1979)]);
        let movies = vec![create_movie("Inception", 2010), create_movie("Alien", 1979)];

        let progress = calculate_list_progress(&list, &movies, &MatchOptions::default());
        assert_eq!(progress.total_movies, 3);
        assert_eq!(progress.watched_count, 2);
        assert_eq!(progress.completion_percentage, 66.7);
        assert_eq!(progress.watched_movies.len(), 2);
        assert_eq!(progress.unwatched_movies, vec![CanonMovie::new("Heat", 1995)]);
    }

    #[test]
    fn test_duplicate_user_movies_do_not_overshoot() {
        let list = create_list("one", &[("Inception", 2010)]);
        let movies = vec![create_movie("Inception", 2010), create_movie("Inception", 2010)];

        let progress = calculate_list_progress(&list, &movies, &MatchOptions::default());
        assert_eq!(progress.watched_count, 1);
        assert_eq!(progress.completion_percentage, 100.0);
    }

    #[test]
    fn test_compare_canon_lists() {
        let lists = vec![
            create_list("sparse", &[("Heat", 1995), ("Ran", 1985)]),
            create_list("full", &[("Inception", 2010)]),
        ];
        let movies = vec![create_movie("Inception", 2010)];

        let comparison = compare_canon_lists(&lists, &movies, &MatchOptions::default());
        assert_eq!(comparison.lists[0].list_id, "full");
        assert_eq!(comparison.overall_stats.total_lists, 2);
        assert_eq!(comparison.overall_stats.average_completion, 50.0);
        assert_eq!(comparison.overall_stats.most_completed.as_deref(), Some("full"));
        assert_eq!(comparison.overall_stats.least_completed.as_deref(), Some("sparse"));
    }

    #[test]
    fn test_compare_no_lists() {
        let comparison = compare_canon_lists(&[], &[], &MatchOptions::default());
        assert_eq!(comparison.overall_stats.total_lists, 0);
        assert_eq!(comparison.overall_stats.average_completion, 0.0);
        assert!(comparison.overall_stats.most_completed.is_none());
    }
}
