use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out reading {name} after {secs}s")]
    Timeout { name: String, secs: u64 },
}

/// A canon list file that can't be turned into a list
#[derive(Debug, Error)]
pub enum CanonListError {
    #[error("failed to read canon list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("canon list {0} is missing metadata (List Title, List Short Version, List URL)")]
    MissingMetadata(String),

    #[error("canon list {0} has no movies")]
    NoMovies(String),
}
