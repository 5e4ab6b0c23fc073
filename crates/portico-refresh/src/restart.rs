//! Restart collaborator

use async_trait::async_trait;
use portico_core::{RefreshRecord, Result};

/// Performs the gateway reload once a refresh cycle detected a change.
/// The coordinator only decides whether a restart is needed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Restarter: Send + Sync {
    /// Reload the gateway with the records of the cycle that changed.
    /// Resolves once the reload completed or definitively failed.
    async fn restart(&self, records: &[RefreshRecord]) -> Result<()>;
}
