//! Route cache file

use portico_core::{Error, RefreshRecord, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Human-readable JSON array of refresh records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCache {
    path: PathBuf,
    ephemeral: bool,
}

impl RouteCache {
    /// Cache stored at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ephemeral: false,
        }
    }

    /// Mark the file as owned by this process only; it is deleted at
    /// teardown
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Cache file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file is deleted at teardown
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    /// True when a regular file exists at the cache path
    pub async fn exists(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
    }

    /// Read the records of the last stored cycle
    pub async fn load(&self) -> Result<Vec<RefreshRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Cache(format!("Failed to read '{}': {e}", self.path.display())))?;

        let records = serde_json::from_str(&content)
            .map_err(|e| Error::Cache(format!("Failed to parse '{}': {e}", self.path.display())))?;

        debug!(path = %self.path.display(), "Loaded route cache");
        Ok(records)
    }

    /// Replace the file with `records`
    pub async fn store(&self, records: &[RefreshRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Cache(format!("Failed to write '{}': {e}", self.path.display())))?;

        debug!(path = %self.path.display(), records = records.len(), "Stored route cache");
        Ok(())
    }

    /// Delete the file; a missing file is not an error
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Cache(format!(
                "Failed to remove '{}': {e}",
                self.path.display()
            ))),
        }
    }
}
