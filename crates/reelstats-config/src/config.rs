use reelstats_models::MatchStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub canon: CanonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Canon list matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_true")]
    pub exact_year_match: bool,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default)]
    pub strategy: MatchStrategy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exact_year_match: default_true(),
            similarity_threshold: default_similarity_threshold(),
            strategy: MatchStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Length of top-rated / most-rewatched lists
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { top_n: default_top_n() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonConfig {
    /// Directory of `*.md` canon lists used when none are given on the command line
    #[serde(default)]
    pub lists_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_top_n() -> usize {
    10
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow::anyhow!(
                "matching.similarity_threshold must be between 0 and 1, got {}",
                threshold
            ));
        }

        if self.ingest.read_timeout_secs == 0 {
            return Err(anyhow::anyhow!("ingest.read_timeout_secs must be greater than 0"));
        }

        if self.analytics.top_n == 0 {
            return Err(anyhow::anyhow!("analytics.top_n must be greater than 0"));
        }

        if let Some(dir) = &self.canon.lists_dir {
            if dir.as_os_str().is_empty() {
                return Err(anyhow::anyhow!("canon.lists_dir cannot be empty"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let config = Config {
            matching: MatchingConfig {
                exact_year_match: false,
                similarity_threshold: 0.9,
                strategy: MatchStrategy::BestMatch,
            },
            analytics: AnalyticsConfig { top_n: 25 },
            canon: CanonConfig {
                lists_dir: Some(PathBuf::from("/tmp/lists")),
            },
            ..Config::default()
        };

        config.save_to_file(file.path()).unwrap();

        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [matching]
            strategy = "best_match"

            [analytics]
            top_n = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.matching.strategy, MatchStrategy::BestMatch);
        assert!(config.matching.exact_year_match);
        assert_eq!(config.matching.similarity_threshold, 0.85);
        assert_eq!(config.analytics.top_n, 5);
        assert_eq!(config.ingest.read_timeout_secs, 30);
        assert_eq!(config.canon.lists_dir, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.analytics.top_n, 10);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.matching.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
        config.matching.similarity_threshold = 0.0;
        assert!(config.validate().is_ok());

        config.ingest.read_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.ingest.read_timeout_secs = 10;

        config.analytics.top_n = 0;
        assert!(config.validate().is_err());
    }
}
