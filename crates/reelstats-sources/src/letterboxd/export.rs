use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::SourceError;
use crate::traits::ExportFile;

/// An export file on disk
#[derive(Debug, Clone)]
pub struct PathExport {
    path: PathBuf,
    name: String,
}

impl PathExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExportFile for PathExport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_to_string(&self) -> Result<String, SourceError> {
        debug!(path = %self.path.display(), "Reading export file");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Read {
                name: self.name.clone(),
                source,
            })
    }
}

/// Export content already held in memory (uploads, tests)
#[derive(Debug, Clone)]
pub struct MemoryExport {
    name: String,
    content: String,
}

impl MemoryExport {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[async_trait]
impl ExportFile for MemoryExport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_to_string(&self) -> Result<String, SourceError> {
        Ok(self.content.clone())
    }
}
