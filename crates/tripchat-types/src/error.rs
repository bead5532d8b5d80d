use thiserror::Error;

/// Errors surfaced by chat operations.
///
/// Every variant maps to a stable error kind at the API boundary.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("missing or invalid credentials")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("storage operation timed out")]
    StorageTimeout,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from repository operations (used by trait definitions in tripchat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage deadline exceeded")]
    Timeout,
}

impl RepositoryError {
    /// Whether a retry might succeed. Only plain storage failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Connection | RepositoryError::Query(_))
    }
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound("entity not found".to_string()),
            RepositoryError::Timeout => ChatError::StorageTimeout,
            RepositoryError::Conflict(msg) => ChatError::Storage(format!("conflict: {msg}")),
            other => ChatError::Storage(other.to_string()),
        }
    }
}
