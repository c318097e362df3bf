use herald_core::{
    Audience, AudienceId, AudienceIntegration, AudienceType, ConfigMap, Integration, Subscriber,
    SubscriberId,
};

use crate::error::StoreError;
use crate::store::EntityStore;

fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), serde_json::Value::from(*v)))
        .collect()
}

/// Run the full entity store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn EntityStore) -> Result<(), StoreError> {
    test_audience_get_or_create(store).await?;
    test_source_get_or_create(store).await?;
    test_subscriber_unique_per_audience(store).await?;
    test_subscriber_requires_audience(store).await?;
    test_link_unique_per_pair(store).await?;
    test_active_links_filter(store).await?;
    test_load_context(store).await?;
    test_delete_audience_cascades(store).await?;
    Ok(())
}

async fn test_audience_get_or_create(store: &dyn EntityStore) -> Result<(), StoreError> {
    let first = store
        .get_or_create_audience("conformance-beta", AudienceType::Waitlist)
        .await?;
    let second = store
        .get_or_create_audience("conformance-beta", AudienceType::Waitlist)
        .await?;
    assert_eq!(first.id, second.id, "same name and type should reuse the audience");

    let other = store
        .get_or_create_audience("conformance-beta", AudienceType::Newsletter)
        .await?;
    assert_ne!(first.id, other.id, "a different type is a different audience");

    let fetched = store.get_audience(&first.id).await?;
    assert_eq!(fetched.map(|a| a.name).as_deref(), Some("conformance-beta"));
    Ok(())
}

async fn test_source_get_or_create(store: &dyn EntityStore) -> Result<(), StoreError> {
    let first = store.get_or_create_source("conformance.example.com").await?;
    let second = store.get_or_create_source("conformance.example.com").await?;
    assert_eq!(first.id, second.id);
    assert!(store.get_source(&first.id).await?.is_some());
    Ok(())
}

async fn test_subscriber_unique_per_audience(store: &dyn EntityStore) -> Result<(), StoreError> {
    let a = store
        .create_audience(Audience::new("conformance-unique-a", AudienceType::Newsletter))
        .await?;
    let b = store
        .create_audience(Audience::new("conformance-unique-b", AudienceType::Newsletter))
        .await?;

    store
        .create_subscriber(Subscriber::new(a.id.clone(), "dup@example.com"))
        .await?;
    let err = store
        .create_subscriber(Subscriber::new(a.id.clone(), "dup@example.com"))
        .await
        .expect_err("duplicate email in the same audience should conflict");
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    // The same email in another audience is a distinct subscriber.
    store
        .create_subscriber(Subscriber::new(b.id.clone(), "dup@example.com"))
        .await?;
    assert_eq!(store.list_subscribers(&a.id).await?.len(), 1);
    assert_eq!(store.list_subscribers(&b.id).await?.len(), 1);
    Ok(())
}

async fn test_subscriber_requires_audience(store: &dyn EntityStore) -> Result<(), StoreError> {
    let orphan = Subscriber::new(AudienceId::new("conformance-missing"), "orphan@example.com");
    let err = store
        .create_subscriber(orphan)
        .await
        .expect_err("unknown audience should be rejected");
    assert!(matches!(err, StoreError::NotFound(_)), "got {err:?}");
    Ok(())
}

async fn test_link_unique_per_pair(store: &dyn EntityStore) -> Result<(), StoreError> {
    let audience = store
        .create_audience(Audience::new("conformance-links", AudienceType::Waitlist))
        .await?;
    let integration = store
        .create_integration(Integration::new(
            "conformance-ntfy",
            "ntfy",
            config(&[("topic", "signups")]),
        ))
        .await?;

    store
        .link_integration(AudienceIntegration::new(
            audience.id.clone(),
            integration.id.clone(),
            ConfigMap::new(),
        ))
        .await?;
    let err = store
        .link_integration(AudienceIntegration::new(
            audience.id.clone(),
            integration.id.clone(),
            ConfigMap::new(),
        ))
        .await
        .expect_err("second link for the same pair should conflict");
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    let found = store.find_integration_by_name("conformance-ntfy").await?;
    assert_eq!(found.map(|i| i.id), Some(integration.id));
    Ok(())
}

async fn test_active_links_filter(store: &dyn EntityStore) -> Result<(), StoreError> {
    let audience = store
        .create_audience(Audience::new("conformance-active", AudienceType::ContactForm))
        .await?;
    let live = store
        .create_integration(Integration::new("conformance-live", "loops", config(&[("api_key", "k")])))
        .await?;
    let paused = store
        .create_integration(Integration::new("conformance-paused", "loops", config(&[("api_key", "k")])))
        .await?;
    let muted = store
        .create_integration(Integration::new("conformance-muted", "loops", config(&[("api_key", "k")])))
        .await?;

    for integration in [&live, &paused, &muted] {
        store
            .link_integration(AudienceIntegration::new(
                audience.id.clone(),
                integration.id.clone(),
                ConfigMap::new(),
            ))
            .await?;
    }
    let links = store.active_links(&audience.id).await?;
    assert_eq!(links.len(), 3);

    // Deactivating the link hides it; deactivating the integration keeps the
    // link visible so the pipeline can skip it.
    let muted_link = links
        .iter()
        .find(|(_, i)| i.id == muted.id)
        .map(|(l, _)| l.id.clone())
        .ok_or_else(|| StoreError::NotFound("muted link".into()))?;
    store.set_link_active(&muted_link, false).await?;
    store.set_integration_active(&paused.id, false).await?;

    let links = store.active_links(&audience.id).await?;
    assert_eq!(links.len(), 2);
    let paused_entry = links.iter().find(|(_, i)| i.id == paused.id);
    assert!(paused_entry.is_some_and(|(_, i)| !i.is_active));
    assert!(links.iter().all(|(l, _)| l.is_active));
    Ok(())
}

async fn test_load_context(store: &dyn EntityStore) -> Result<(), StoreError> {
    let audience = store
        .create_audience(Audience::new("conformance-context", AudienceType::Newsletter))
        .await?;
    let source = store.get_or_create_source("context.example.com").await?;
    let subscriber = store
        .create_subscriber(
            Subscriber::new(audience.id.clone(), "ctx@example.com")
                .with_name("Ada", "Lovelace")
                .with_source(source.id.clone()),
        )
        .await?;

    let ctx = store.load_context(&subscriber.id).await?;
    assert_eq!(ctx.email(), "ctx@example.com");
    assert_eq!(ctx.audience_name(), Some("conformance-context"));
    assert_eq!(ctx.source_domain(), Some("context.example.com"));

    let err = store
        .load_context(&SubscriberId::new("conformance-ghost"))
        .await
        .expect_err("unknown subscriber should not resolve");
    assert!(matches!(err, StoreError::NotFound(_)));
    Ok(())
}

async fn test_delete_audience_cascades(store: &dyn EntityStore) -> Result<(), StoreError> {
    let audience = store
        .create_audience(Audience::new("conformance-doomed", AudienceType::Waitlist))
        .await?;
    let integration = store
        .create_integration(Integration::new("conformance-doomed-hook", "ntfy", config(&[("topic", "t")])))
        .await?;
    store
        .link_integration(AudienceIntegration::new(
            audience.id.clone(),
            integration.id.clone(),
            ConfigMap::new(),
        ))
        .await?;
    let s1 = store
        .create_subscriber(Subscriber::new(audience.id.clone(), "one@example.com"))
        .await?;
    let s2 = store
        .create_subscriber(Subscriber::new(audience.id.clone(), "two@example.com"))
        .await?;

    let mut removed = store.delete_audience(&audience.id).await?;
    removed.sort();
    let mut expected = vec![s1.id.clone(), s2.id.clone()];
    expected.sort();
    assert_eq!(removed, expected);

    assert!(store.get_audience(&audience.id).await?.is_none());
    assert!(store.get_subscriber(&s1.id).await?.is_none());
    assert!(store.active_links(&audience.id).await?.is_empty());
    // Integrations outlive the audiences they were linked to.
    assert!(store.get_integration(&integration.id).await?.is_some());

    // The email is free again once the audience is gone.
    let fresh = store
        .create_audience(Audience::new("conformance-doomed", AudienceType::Waitlist))
        .await?;
    store
        .create_subscriber(Subscriber::new(fresh.id, "one@example.com"))
        .await?;
    Ok(())
}
