use herald_audit::LogStoreError;
use herald_core::SubscriberId;
use herald_store::StoreError;
use thiserror::Error;

/// Errors that abort a whole dispatch run or audience purge.
///
/// Per-integration failures never surface here; they are written to the
/// integration log and reported in the [`DispatchReport`](crate::DispatchReport).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Loading the subscriber graph or its links failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Pruning integration logs failed.
    #[error("log store error: {0}")]
    LogStore(#[from] LogStoreError),

    /// The pipeline was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors returned when handing a [`SubscriberCreated`](crate::SubscriberCreated)
/// event to the worker pool.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("dispatch queue is full; dropped event for subscriber {0}")]
    Full(SubscriberId),

    #[error("dispatch queue is closed; dropped event for subscriber {0}")]
    Closed(SubscriberId),
}

/// Errors that reject a public submission.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The email is already subscribed to the audience.
    #[error("duplicate subscriber: {0}")]
    Duplicate(String),

    #[error("invalid submission: {0}")]
    Invalid(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Self::Duplicate(msg),
            other => Self::Store(other),
        }
    }
}
