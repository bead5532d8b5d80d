//! Deadline and retry policy for storage calls.
//!
//! Every repository call made by a service goes through a [`StorageGuard`].
//! Reads get a deadline plus a single retry after a short backoff when the
//! failure looks transient. Writes are never cut off once handed to the
//! store: the deadline for a write covers only the wait for the writer
//! connection, which the store enforces and reports as
//! [`RepositoryError::Timeout`]. A caller that sees a timeout therefore
//! knows nothing was written.

use std::future::Future;
use std::time::Duration;

use tracing::warn;
use tripchat_types::config::ChatConfig;
use tripchat_types::error::RepositoryError;

#[derive(Debug, Clone, Copy)]
pub struct StorageGuard {
    timeout: Duration,
    retry_backoff: Duration,
}

impl StorageGuard {
    pub fn new(timeout: Duration, retry_backoff: Duration) -> Self {
        Self {
            timeout,
            retry_backoff,
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(config.storage_timeout(), config.read_retry_backoff())
    }

    /// Run a write to completion and report its real outcome. Writes are
    /// never retried here.
    pub async fn write<T>(
        &self,
        fut: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, RepositoryError> {
        let result = fut.await;
        if let Err(RepositoryError::Timeout) = &result {
            warn!(
                timeout_ms = self.timeout.as_millis() as u64,
                "Writer connection not available in time"
            );
        }
        result
    }

    async fn deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, RepositoryError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout),
        }
    }

    /// Run an idempotent read under the deadline, retrying once on a
    /// transient failure.
    pub async fn read<T, F, Fut>(&self, mut op: F) -> Result<T, RepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        match self.deadline(op()).await {
            Err(e) if e.is_transient() => {
                warn!(error = %e, "Storage read failed, retrying once");
                tokio::time::sleep(self.retry_backoff).await;
                self.deadline(op()).await
            }
            other => other,
        }
    }
}

impl Default for StorageGuard {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}
