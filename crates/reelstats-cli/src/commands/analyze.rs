use super::ingest_paths;
use crate::output::{key_value_table, styled_table, Output, OutputFormat};
use color_eyre::Result;
use comfy_table::Cell;
use reelstats_config::Config;
use reelstats_core::analytics::{
    compute_analytics, compute_rating_consistency, compute_tag_distribution, compute_viewing_velocity,
    ratings_by_decade, top_movies_by_rating, top_rewatched_movies, AnalyticsOverview,
};
use reelstats_core::resolve_favorite_films;
use reelstats_models::{Movie, UserProfile};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub async fn run_analyze(files: Vec<PathBuf>, top: Option<usize>, config: &Config, output: &Output) -> Result<()> {
    tracing::debug!(files = files.len(), "Analyze command started");

    let outcome = ingest_paths(&files, config, output).await?;
    let watched = &outcome.dataset.watched;
    let top_n = top.unwrap_or(config.analytics.top_n);

    let analytics = compute_analytics(watched);
    let top_rated = top_movies_by_rating(watched, top_n);
    let top_rewatched = top_rewatched_movies(watched, top_n);

    match output.format() {
        OutputFormat::Human => {
            print_overview(&analytics, watched, output);
            print_counts("Ratings", "Stars", &analytics.rating_distribution, output);
            print_counts("Decades", "Decade", &analytics.decade_breakdown, output);
            print_counts("Eras", "Era", &analytics.era_breakdown, output);
            print_decade_ratings(watched, output);
            print_movies("Top Rated", &top_rated, output);
            print_movies("Most Rewatched", &top_rewatched, output);
            if let Some(profile) = &outcome.dataset.user_profile {
                print_profile(profile, watched, output);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "files": outcome.files,
                "analytics": analytics,
                "viewing_velocity": compute_viewing_velocity(watched),
                "rating_consistency": compute_rating_consistency(watched),
                "ratings_by_decade": ratings_by_decade(watched),
                "tags": compute_tag_distribution(watched),
                "top_rated": top_rated,
                "top_rewatched": top_rewatched,
                "watchlist_size": outcome.dataset.watchlist.len(),
            }));
        }
    }

    Ok(())
}

fn print_overview(analytics: &AnalyticsOverview, watched: &[Movie], output: &Output) {
    let span = match (analytics.time_span.earliest, analytics.time_span.latest) {
        (Some(first), Some(last)) => format!("{} to {} ({} days)", first, last, analytics.time_span.days),
        _ => "-".to_string(),
    };

    let table = key_value_table([
        ("Movies Watched", analytics.total_movies_watched.to_string()),
        (
            "Rated",
            format!("{} ({}%)", analytics.movies_rated, analytics.rating_coverage),
        ),
        ("Liked", format!("{} ({}%)", analytics.movies_liked, analytics.like_ratio)),
        ("Average Rating", format!("{:.1}", analytics.average_rating)),
        ("Median Rating", format!("{:.1}", analytics.median_rating)),
        ("Rating Spread", format!("{:.2}", compute_rating_consistency(watched))),
        (
            "Rewatched",
            format!(
                "{} movies, {} rewatches ({}%)",
                analytics.movies_rewatched, analytics.total_rewatches, analytics.rewatch_rate
            ),
        ),
        ("Time Span", span),
        ("Movies per Day", format!("{:.3}", compute_viewing_velocity(watched))),
    ]);
    output.table("Overview", &table);
}

fn print_counts<K: ToString>(title: &str, label: &str, counts: &BTreeMap<K, usize>, output: &Output) {
    if counts.is_empty() {
        return;
    }
    let mut table = styled_table(&[label, "Movies"]);
    for (key, count) in counts {
        table.add_row(vec![Cell::new(key.to_string()), Cell::new(count)]);
    }
    output.table(title, &table);
}

fn print_decade_ratings(watched: &[Movie], output: &Output) {
    let by_decade = ratings_by_decade(watched);
    if by_decade.is_empty() {
        return;
    }
    let mut table = styled_table(&["Decade", "Average", "Rated"]);
    for (decade, aggregate) in &by_decade {
        table.add_row(vec![
            Cell::new(format!("{}s", decade)),
            Cell::new(format!("{:.1}", aggregate.average)),
            Cell::new(aggregate.count),
        ]);
    }
    output.table("Ratings by Decade", &table);
}

fn print_profile(profile: &UserProfile, watched: &[Movie], output: &Output) {
    output.info(format!("\nProfile: {} ({})", profile.username, profile.full_name()));

    let favorites = resolve_favorite_films(profile, watched);
    if favorites.is_empty() {
        return;
    }
    let mut table = styled_table(&["Favorite", "Rating", "Watched"]);
    for film in &favorites {
        table.add_row(vec![
            Cell::new(film.title.as_deref().unwrap_or(&film.uri)),
            Cell::new(film.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())),
            Cell::new(if film.watched == Some(true) { "yes" } else { "no" }),
        ]);
    }
    output.table("Favorite Films", &table);
}

fn print_movies(title: &str, movies: &[&Movie], output: &Output) {
    if movies.is_empty() {
        return;
    }
    let mut table = styled_table(&["#", "Title", "Year", "Rating", "Viewings"]);
    for (i, movie) in movies.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&movie.title),
            Cell::new(movie.year),
            Cell::new(movie.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())),
            Cell::new(movie.rewatch_count),
        ]);
    }
    output.table(title, &table);
}
