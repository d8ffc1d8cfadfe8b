use clap::{ArgAction, Parser, Subcommand};
use commands::{analyze, canon, config, validate};
use reelstats_config::{Config, PathManager};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reelstats")]
#[command(about = "ReelStats - Statistics and canon list progress from your Letterboxd export")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (defaults to ~/.config/reelstats/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to a daily-rotated file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge export files and print viewing statistics
    #[command(long_about = "Ingest Letterboxd export CSVs (watched.csv is required; diary, ratings, likes/films, watchlist and profile are optional), merge them and print an overview, distributions and top lists.")]
    Analyze {
        /// Export CSV files
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Length of the top lists (overrides analytics.top_n)
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },
    /// Show progress through canon lists
    Canon {
        /// Export CSV files
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Canon list markdown file or directory (repeatable; defaults to canon.lists_dir)
        #[arg(long = "list", value_name = "PATH")]
        lists: Vec<PathBuf>,

        /// Pick the most similar title per list entry instead of the first acceptable one
        #[arg(long, action = ArgAction::SetTrue)]
        best_match: bool,

        /// Allow release years to differ by one
        #[arg(long, action = ArgAction::SetTrue)]
        loose_year: bool,

        /// Minimum title similarity in [0, 1]
        #[arg(long, value_name = "SCORE")]
        threshold: Option<f64>,
    },
    /// Check export files and report detected types and problems
    Validate {
        /// Export CSV files
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let config_file = cli.config.clone().unwrap_or_else(|| PathManager::default().config_file());
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

    logging::init_logging(cli.verbose, cli.quiet, &config.logging, cli.log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    let result = match cli.command {
        Commands::Analyze { files, top } => analyze::run_analyze(files, top, &config, &output).await,
        Commands::Canon {
            files,
            lists,
            best_match,
            loose_year,
            threshold,
        } => {
            let args = canon::CanonArgs {
                lists,
                best_match,
                loose_year,
                threshold,
            };
            canon::run_canon(files, args, &config, &output).await
        }
        Commands::Validate { files } => validate::run_validate(files, &config, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &config, &config_file, &output),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
