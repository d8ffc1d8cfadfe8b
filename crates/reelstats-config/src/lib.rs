pub mod config;
pub mod paths;

pub use config::{AnalyticsConfig, CanonConfig, Config, IngestConfig, LoggingConfig, MatchingConfig};
pub use paths::{PathManager, CONFIG_DIR_ENV};
