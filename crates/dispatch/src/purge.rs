use herald_audit::IntegrationLogStore;
use herald_core::AudienceId;
use herald_store::EntityStore;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::DispatchError;

/// What [`purge_audience`] removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudiencePurge {
    pub subscribers: usize,
    pub logs: u64,
}

/// Delete an audience with its subscribers and links, then prune the
/// integration logs of every removed subscriber.
///
/// Integrations themselves are kept. A log store failure after the audience
/// is gone leaves the remaining rows orphaned; they can be pruned by calling
/// [`IntegrationLogStore::delete_for_subscriber`] again.
#[instrument(name = "audience.purge", skip_all, fields(audience_id = %id))]
pub async fn purge_audience(
    store: &dyn EntityStore,
    logs: &dyn IntegrationLogStore,
    id: &AudienceId,
) -> Result<AudiencePurge, DispatchError> {
    let removed = store.delete_audience(id).await?;

    let mut purge = AudiencePurge {
        subscribers: removed.len(),
        logs: 0,
    };
    for subscriber_id in &removed {
        purge.logs += logs.delete_for_subscriber(subscriber_id).await?;
    }

    info!(
        subscribers = purge.subscribers,
        logs = purge.logs,
        "audience purged"
    );
    Ok(purge)
}
