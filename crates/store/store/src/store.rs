use async_trait::async_trait;
use herald_core::{
    Audience, AudienceId, AudienceIntegration, AudienceType, Integration, IntegrationId, LinkId,
    Source, SourceId, Subscriber, SubscriberContext, SubscriberId,
};

use crate::error::StoreError;

/// An active audience link joined with its integration.
pub type ActiveLink = (AudienceIntegration, Integration);

/// Trait for persisting Herald's entities.
///
/// Implementations must be `Send + Sync` and enforce the uniqueness
/// constraints atomically: `(audience, email)` for subscribers and
/// `(audience, integration)` for links.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_audience(&self, audience: Audience) -> Result<Audience, StoreError>;

    /// Return the audience with this name and type, creating it if needed.
    async fn get_or_create_audience(
        &self,
        name: &str,
        audience_type: AudienceType,
    ) -> Result<Audience, StoreError>;

    async fn get_audience(&self, id: &AudienceId) -> Result<Option<Audience>, StoreError>;

    async fn list_audiences(&self) -> Result<Vec<Audience>, StoreError>;

    /// Delete an audience with its subscribers and links.
    ///
    /// Returns the ids of the deleted subscribers so dependent records can be
    /// pruned by the caller.
    async fn delete_audience(&self, id: &AudienceId) -> Result<Vec<SubscriberId>, StoreError>;

    /// Return the source for this domain, creating it if needed.
    async fn get_or_create_source(&self, domain: &str) -> Result<Source, StoreError>;

    async fn get_source(&self, id: &SourceId) -> Result<Option<Source>, StoreError>;

    /// Persist a new subscriber.
    ///
    /// Fails with [`StoreError::Conflict`] when the email already exists in
    /// the audience and [`StoreError::NotFound`] when the audience does not.
    async fn create_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError>;

    async fn get_subscriber(&self, id: &SubscriberId) -> Result<Option<Subscriber>, StoreError>;

    async fn list_subscribers(&self, audience: &AudienceId) -> Result<Vec<Subscriber>, StoreError>;

    async fn create_integration(&self, integration: Integration) -> Result<Integration, StoreError>;

    async fn get_integration(&self, id: &IntegrationId) -> Result<Option<Integration>, StoreError>;

    async fn find_integration_by_name(&self, name: &str) -> Result<Option<Integration>, StoreError>;

    async fn list_integrations(&self) -> Result<Vec<Integration>, StoreError>;

    async fn set_integration_active(&self, id: &IntegrationId, active: bool) -> Result<(), StoreError>;

    /// Link an integration to an audience.
    ///
    /// Fails with [`StoreError::Conflict`] when the pair is already linked.
    async fn link_integration(
        &self,
        link: AudienceIntegration,
    ) -> Result<AudienceIntegration, StoreError>;

    async fn set_link_active(&self, id: &LinkId, active: bool) -> Result<(), StoreError>;

    /// Active links of an audience with their integrations. Order unspecified.
    async fn active_links(&self, audience: &AudienceId) -> Result<Vec<ActiveLink>, StoreError>;

    /// Resolve a subscriber with its audience and source.
    async fn load_context(&self, id: &SubscriberId) -> Result<SubscriberContext, StoreError> {
        let subscriber = self
            .get_subscriber(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("subscriber {id}")))?;
        let audience = self
            .get_audience(&subscriber.audience_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("audience {}", subscriber.audience_id)))?;
        let source = match &subscriber.source_id {
            Some(source_id) => self.get_source(source_id).await?,
            None => None,
        };
        Ok(SubscriberContext::new(subscriber, audience, source))
    }
}
