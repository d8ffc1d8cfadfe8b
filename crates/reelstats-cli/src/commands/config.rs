use crate::output::{key_value_table, Output, OutputFormat};
use color_eyre::Result;
use owo_colors::OwoColorize;
use reelstats_config::Config;
use serde_json::json;
use std::path::Path;

pub fn run_config(cmd: crate::ConfigCommands, config: &Config, config_file: &Path, output: &Output) -> Result<()> {
    match cmd {
        crate::ConfigCommands::Show => show_config(config, config_file, output),
        crate::ConfigCommands::Init { force } => init_config(config_file, force, output),
    }
}

fn show_config(config: &Config, config_file: &Path, output: &Output) -> Result<()> {
    match output.format() {
        OutputFormat::Human => {
            if !config_file.exists() {
                output.warn(format!(
                    "No configuration file at {}, showing defaults",
                    config_file.display()
                ));
            }

            let yes_no = |b: bool| if b { "✓".green().to_string() } else { "✗".red().to_string() };
            let or_none = |p: Option<&Path>| {
                p.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".bright_black().to_string())
            };

            let table = key_value_table([
                ("Config File", config_file.display().to_string()),
                ("Exact Year Match", yes_no(config.matching.exact_year_match)),
                ("Similarity Threshold", config.matching.similarity_threshold.to_string()),
                ("Match Strategy", format!("{:?}", config.matching.strategy)),
                ("Top N", config.analytics.top_n.to_string()),
                ("Read Timeout", format!("{} seconds", config.ingest.read_timeout_secs)),
                ("Canon Lists Dir", or_none(config.canon.lists_dir.as_deref())),
                ("Log Level", config.logging.level.clone()),
                ("JSON Logs", yes_no(config.logging.json)),
                ("Log File", or_none(config.logging.file.as_deref())),
            ]);
            output.table("Configuration", &table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": config_file.display().to_string(),
                "exists": config_file.exists(),
                "config": config,
            }));
        }
    }
    Ok(())
}

fn init_config(config_file: &Path, force: bool, output: &Output) -> Result<()> {
    if config_file.exists() && !force {
        return Err(color_eyre::eyre::eyre!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
    }

    Config::default()
        .save_to_file(config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write config to {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
