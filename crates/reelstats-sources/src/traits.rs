use async_trait::async_trait;
use std::time::Duration;

use crate::error::SourceError;

/// A raw export file whose content is read asynchronously
#[async_trait]
pub trait ExportFile: Send + Sync {
    /// File name as uploaded, used for type detection
    fn name(&self) -> &str;

    async fn read_to_string(&self) -> Result<String, SourceError>;
}

/// Read a file, giving up after `limit`
pub async fn read_with_timeout(file: &dyn ExportFile, limit: Duration) -> Result<String, SourceError> {
    match tokio::time::timeout(limit, file.read_to_string()).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout {
            name: file.name().to_string(),
            secs: limit.as_secs(),
        }),
    }
}
