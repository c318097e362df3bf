use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use herald_core::{
    Audience, AudienceId, AudienceIntegration, AudienceType, Integration, IntegrationId, LinkId,
    Source, SourceId, Subscriber, SubscriberId,
};
use herald_store::{ActiveLink, EntityStore, StoreError};

/// In-memory entity store using `DashMap`. Suitable for development and
/// testing.
///
/// Uniqueness is enforced through index maps claimed with the `entry` API, so
/// concurrent inserts of the same key cannot both succeed.
pub struct MemoryEntityStore {
    audiences: DashMap<AudienceId, Audience>,
    audience_index: DashMap<(String, AudienceType), AudienceId>,
    sources: DashMap<SourceId, Source>,
    source_index: DashMap<String, SourceId>,
    subscribers: DashMap<SubscriberId, Subscriber>,
    subscriber_index: DashMap<(AudienceId, String), SubscriberId>,
    integrations: DashMap<IntegrationId, Integration>,
    links: DashMap<LinkId, AudienceIntegration>,
    link_index: DashMap<(AudienceId, IntegrationId), LinkId>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self {
            audiences: DashMap::new(),
            audience_index: DashMap::new(),
            sources: DashMap::new(),
            source_index: DashMap::new(),
            subscribers: DashMap::new(),
            subscriber_index: DashMap::new(),
            integrations: DashMap::new(),
            links: DashMap::new(),
            link_index: DashMap::new(),
        }
    }

    /// Number of stored subscribers across all audiences.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for MemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn create_audience(&self, audience: Audience) -> Result<Audience, StoreError> {
        match self
            .audience_index
            .entry((audience.name.clone(), audience.audience_type))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "audience {} ({}) already exists",
                audience.name, audience.audience_type
            ))),
            Entry::Vacant(slot) => {
                self.audiences.insert(audience.id.clone(), audience.clone());
                slot.insert(audience.id.clone());
                Ok(audience)
            }
        }
    }

    async fn get_or_create_audience(
        &self,
        name: &str,
        audience_type: AudienceType,
    ) -> Result<Audience, StoreError> {
        let id = match self.audience_index.entry((name.to_owned(), audience_type)) {
            Entry::Occupied(slot) => slot.get().clone(),
            Entry::Vacant(slot) => {
                let audience = Audience::new(name, audience_type);
                let id = audience.id.clone();
                self.audiences.insert(id.clone(), audience);
                slot.insert(id.clone());
                id
            }
        };
        self.audiences
            .get(&id)
            .map(|a| a.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("audience {id}")))
    }

    async fn get_audience(&self, id: &AudienceId) -> Result<Option<Audience>, StoreError> {
        Ok(self.audiences.get(id).map(|a| a.value().clone()))
    }

    async fn list_audiences(&self) -> Result<Vec<Audience>, StoreError> {
        let mut audiences: Vec<Audience> =
            self.audiences.iter().map(|a| a.value().clone()).collect();
        audiences.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(audiences)
    }

    async fn delete_audience(&self, id: &AudienceId) -> Result<Vec<SubscriberId>, StoreError> {
        let (_, audience) = self
            .audiences
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("audience {id}")))?;
        self.audience_index
            .remove(&(audience.name, audience.audience_type));

        let doomed: Vec<Subscriber> = self
            .subscribers
            .iter()
            .filter(|s| s.audience_id == *id)
            .map(|s| s.value().clone())
            .collect();
        for subscriber in &doomed {
            self.subscribers.remove(&subscriber.id);
            self.subscriber_index
                .remove(&(id.clone(), subscriber.email.clone()));
        }

        self.links.retain(|_, link| link.audience_id != *id);
        self.link_index.retain(|(audience_id, _), _| audience_id != id);

        Ok(doomed.into_iter().map(|s| s.id).collect())
    }

    async fn get_or_create_source(&self, domain: &str) -> Result<Source, StoreError> {
        let id = match self.source_index.entry(domain.to_owned()) {
            Entry::Occupied(slot) => slot.get().clone(),
            Entry::Vacant(slot) => {
                let source = Source::new(domain);
                let id = source.id.clone();
                self.sources.insert(id.clone(), source);
                slot.insert(id.clone());
                id
            }
        };
        self.sources
            .get(&id)
            .map(|s| s.value().clone())
            .ok_or_else(|| StoreError::NotFound(format!("source {id}")))
    }

    async fn get_source(&self, id: &SourceId) -> Result<Option<Source>, StoreError> {
        Ok(self.sources.get(id).map(|s| s.value().clone()))
    }

    async fn create_subscriber(&self, subscriber: Subscriber) -> Result<Subscriber, StoreError> {
        if !self.audiences.contains_key(&subscriber.audience_id) {
            return Err(StoreError::NotFound(format!(
                "audience {}",
                subscriber.audience_id
            )));
        }
        match self
            .subscriber_index
            .entry((subscriber.audience_id.clone(), subscriber.email.clone()))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "{} is already subscribed to audience {}",
                subscriber.email, subscriber.audience_id
            ))),
            Entry::Vacant(slot) => {
                self.subscribers
                    .insert(subscriber.id.clone(), subscriber.clone());
                slot.insert(subscriber.id.clone());
                Ok(subscriber)
            }
        }
    }

    async fn get_subscriber(&self, id: &SubscriberId) -> Result<Option<Subscriber>, StoreError> {
        Ok(self.subscribers.get(id).map(|s| s.value().clone()))
    }

    async fn list_subscribers(&self, audience: &AudienceId) -> Result<Vec<Subscriber>, StoreError> {
        let mut subscribers: Vec<Subscriber> = self
            .subscribers
            .iter()
            .filter(|s| s.audience_id == *audience)
            .map(|s| s.value().clone())
            .collect();
        subscribers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(subscribers)
    }

    async fn create_integration(&self, integration: Integration) -> Result<Integration, StoreError> {
        match self.integrations.entry(integration.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "integration {} already exists",
                integration.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(integration.clone());
                Ok(integration)
            }
        }
    }

    async fn get_integration(&self, id: &IntegrationId) -> Result<Option<Integration>, StoreError> {
        Ok(self.integrations.get(id).map(|i| i.value().clone()))
    }

    async fn find_integration_by_name(&self, name: &str) -> Result<Option<Integration>, StoreError> {
        Ok(self
            .integrations
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.value().clone()))
    }

    async fn list_integrations(&self) -> Result<Vec<Integration>, StoreError> {
        let mut integrations: Vec<Integration> =
            self.integrations.iter().map(|i| i.value().clone()).collect();
        integrations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(integrations)
    }

    async fn set_integration_active(&self, id: &IntegrationId, active: bool) -> Result<(), StoreError> {
        let mut integration = self
            .integrations
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("integration {id}")))?;
        integration.is_active = active;
        Ok(())
    }

    async fn link_integration(
        &self,
        link: AudienceIntegration,
    ) -> Result<AudienceIntegration, StoreError> {
        if !self.audiences.contains_key(&link.audience_id) {
            return Err(StoreError::NotFound(format!("audience {}", link.audience_id)));
        }
        if !self.integrations.contains_key(&link.integration_id) {
            return Err(StoreError::NotFound(format!(
                "integration {}",
                link.integration_id
            )));
        }
        match self
            .link_index
            .entry((link.audience_id.clone(), link.integration_id.clone()))
        {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "integration {} is already linked to audience {}",
                link.integration_id, link.audience_id
            ))),
            Entry::Vacant(slot) => {
                self.links.insert(link.id.clone(), link.clone());
                slot.insert(link.id.clone());
                Ok(link)
            }
        }
    }

    async fn set_link_active(&self, id: &LinkId, active: bool) -> Result<(), StoreError> {
        let mut link = self
            .links
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("link {id}")))?;
        link.is_active = active;
        Ok(())
    }

    async fn active_links(&self, audience: &AudienceId) -> Result<Vec<ActiveLink>, StoreError> {
        let links: Vec<AudienceIntegration> = self
            .links
            .iter()
            .filter(|l| l.audience_id == *audience && l.is_active)
            .map(|l| l.value().clone())
            .collect();

        let mut joined = Vec::with_capacity(links.len());
        for link in links {
            // A link whose integration vanished is dropped rather than failing
            // the whole dispatch.
            if let Some(integration) = self.integrations.get(&link.integration_id) {
                joined.push((link, integration.value().clone()));
            }
        }
        Ok(joined)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_core::ConfigMap;
    use herald_store::testing::run_store_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryEntityStore::new();
        run_store_conformance_tests(&store).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_duplicate_subscribers_yield_one_row() {
        let store = Arc::new(MemoryEntityStore::new());
        let audience = store
            .create_audience(Audience::new("Launch", AudienceType::Waitlist))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            let audience_id = audience.id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create_subscriber(Subscriber::new(audience_id, "race@example.com"))
                    .await
                    .is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn create_audience_conflicts_on_name_and_type() {
        let store = MemoryEntityStore::new();
        store
            .create_audience(Audience::new("Launch", AudienceType::Waitlist))
            .await
            .unwrap();
        let err = store
            .create_audience(Audience::new("Launch", AudienceType::Waitlist))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn link_requires_known_integration() {
        let store = MemoryEntityStore::new();
        let audience = store
            .create_audience(Audience::new("Launch", AudienceType::Waitlist))
            .await
            .unwrap();
        let err = store
            .link_integration(AudienceIntegration::new(
                audience.id,
                IntegrationId::new("ghost"),
                ConfigMap::new(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn toggling_unknown_rows_is_not_found() {
        let store = MemoryEntityStore::new();
        assert!(matches!(
            store.set_link_active(&LinkId::new("x"), false).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store
                .set_integration_active(&IntegrationId::new("x"), false)
                .await,
            Err(StoreError::NotFound(_))
        ));
    }
}
