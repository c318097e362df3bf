use async_trait::async_trait;
use herald_core::{LogId, SubscriberId};

use crate::error::LogStoreError;
use crate::record::{IntegrationLog, LogCompletion, LogPage, LogQuery};

/// Trait for integration log storage backends.
///
/// Implementations must be `Send + Sync` to be shared across async tasks.
#[async_trait]
pub trait IntegrationLogStore: Send + Sync {
    /// Append a new row (normally `pending`).
    async fn record(&self, entry: IntegrationLog) -> Result<(), LogStoreError>;

    /// Finalize a pending row. Fails if the row is missing or already final.
    async fn complete(
        &self,
        id: &LogId,
        completion: LogCompletion,
    ) -> Result<IntegrationLog, LogStoreError>;

    async fn get(&self, id: &LogId) -> Result<Option<IntegrationLog>, LogStoreError>;

    /// Query rows with filters and pagination, newest first.
    async fn query(&self, query: &LogQuery) -> Result<LogPage, LogStoreError>;

    /// Remove every row of a subscriber. Returns the number of rows deleted.
    async fn delete_for_subscriber(&self, subscriber_id: &SubscriberId) -> Result<u64, LogStoreError>;
}
