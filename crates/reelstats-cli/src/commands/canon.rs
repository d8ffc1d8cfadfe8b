use super::ingest_paths;
use crate::output::{key_value_table, styled_table, Output, OutputFormat};
use color_eyre::Result;
use comfy_table::Cell;
use reelstats_config::Config;
use reelstats_core::{compare_canon_lists, MatchOptions};
use reelstats_models::{CanonList, MatchStrategy};
use reelstats_sources::{load_canon_dir, load_canon_file};
use serde_json::json;
use std::path::PathBuf;

/// Flags that override `[matching]`
pub struct CanonArgs {
    pub lists: Vec<PathBuf>,
    pub best_match: bool,
    pub loose_year: bool,
    pub threshold: Option<f64>,
}

pub fn match_options(config: &Config, args: &CanonArgs) -> MatchOptions {
    MatchOptions {
        exact_year_match: config.matching.exact_year_match && !args.loose_year,
        similarity_threshold: args.threshold.unwrap_or(config.matching.similarity_threshold),
        strategy: if args.best_match {
            MatchStrategy::BestMatch
        } else {
            config.matching.strategy
        },
    }
}

/// Lists from the given paths (files or directories), or the configured directory
async fn load_lists(args: &CanonArgs, config: &Config) -> Result<Vec<CanonList>> {
    let paths: Vec<PathBuf> = if args.lists.is_empty() {
        match &config.canon.lists_dir {
            Some(dir) => vec![dir.clone()],
            None => {
                return Err(color_eyre::eyre::eyre!(
                    "No canon lists given; pass --list or set canon.lists_dir in the config"
                ))
            }
        }
    } else {
        args.lists.clone()
    };

    let mut lists = Vec::new();
    for path in &paths {
        if path.is_dir() {
            lists.extend(load_canon_dir(path).await?);
        } else {
            lists.push(load_canon_file(path).await?);
        }
    }

    if lists.is_empty() {
        return Err(color_eyre::eyre::eyre!("No usable canon lists found"));
    }
    Ok(lists)
}

pub async fn run_canon(files: Vec<PathBuf>, args: CanonArgs, config: &Config, output: &Output) -> Result<()> {
    let options = match_options(config, &args);
    if !(0.0..=1.0).contains(&options.similarity_threshold) {
        return Err(color_eyre::eyre::eyre!("--threshold must be between 0 and 1"));
    }
    tracing::debug!(?options, "Canon command started");

    let lists = load_lists(&args, config).await?;
    let outcome = ingest_paths(&files, config, output).await?;
    let comparison = compare_canon_lists(&lists, &outcome.dataset.watched, &options);

    match output.format() {
        OutputFormat::Human => {
            let mut table = styled_table(&["List", "Watched", "Total", "Completion"]);
            for progress in &comparison.lists {
                table.add_row(vec![
                    Cell::new(&progress.list_title),
                    Cell::new(progress.watched_count),
                    Cell::new(progress.total_movies),
                    Cell::new(format!("{:.1}%", progress.completion_percentage)),
                ]);
            }
            output.table("Canon Lists", &table);

            let stats = &comparison.overall_stats;
            let summary = key_value_table([
                ("Lists", stats.total_lists.to_string()),
                ("Average Completion", format!("{:.1}%", stats.average_completion)),
                ("Most Completed", stats.most_completed.clone().unwrap_or_else(|| "-".to_string())),
                ("Least Completed", stats.least_completed.clone().unwrap_or_else(|| "-".to_string())),
            ]);
            output.table("Overall", &summary);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "files": outcome.files,
                "comparison": comparison,
            }));
        }
    }

    Ok(())
}
