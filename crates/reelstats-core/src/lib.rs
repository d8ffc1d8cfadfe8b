pub mod analytics;
pub mod canon;
pub mod ingest;
pub mod merge;

pub use analytics::{compute_analytics, round_to, AnalyticsOverview, RatingAggregate, RatingScale, RewatchStats, TimeSpan};
pub use canon::{
    calculate_list_progress, compare_canon_lists, find_match_pairs, find_matched_movies, find_unwatched_movies,
    get_match_stats, match_movie, normalize_title, MatchOptions, MatchPair, MatchStats,
};
pub use ingest::{collect_sources, ingest_exports, FileReport, IngestError, IngestOutcome};
pub use merge::{
    aggregate_rewatches, deduplicate_movies, merge_movie_sources, resolve_conflicts, resolve_favorite_films,
    update_dataset, MergeError, MergeSources, SourceRole,
};
