/// Errors that can occur during integration log operations.
#[derive(Debug, thiserror::Error)]
pub enum LogStoreError {
    /// No row exists with the given id.
    #[error("integration log not found: {0}")]
    NotFound(String),

    /// The row was already finalized; rows are completed exactly once.
    #[error("integration log already completed: {0}")]
    AlreadyCompleted(String),

    /// An error from the underlying storage backend.
    #[error("storage error: {0}")]
    Storage(String),
}
