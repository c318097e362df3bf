use herald_core::{Audience, AudienceIntegration, Integration};
use herald_provider::ProviderRegistry;
use herald_store::EntityStore;
use tracing::{info, warn};

use crate::config::HeraldConfig;
use crate::error::ServerError;

/// Counts of entities created by [`load_seeds`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub integrations: usize,
    pub audiences: usize,
    pub links: usize,
}

/// Load configured integrations, audiences, and links into the store.
///
/// Unknown integration types, duplicate integration names, and links to
/// undeclared integrations are startup errors. An integration whose config
/// lacks required keys is loaded with a warning; its dispatches will fail
/// with a configuration error until the config is fixed.
pub async fn load_seeds(
    config: &HeraldConfig,
    store: &dyn EntityStore,
    registry: &ProviderRegistry,
) -> Result<SeedSummary, ServerError> {
    let mut summary = SeedSummary::default();

    for seed in &config.integrations {
        if !registry.contains(&seed.integration_type) {
            return Err(ServerError::Config(format!(
                "integration {:?} has unknown type {:?} (known: {})",
                seed.name,
                seed.integration_type,
                registry.kinds().join(", ")
            )));
        }
        if store.find_integration_by_name(&seed.name).await?.is_some() {
            return Err(ServerError::Config(format!(
                "duplicate integration name {:?}",
                seed.name
            )));
        }

        let provider = registry
            .build(&seed.integration_type, seed.config.clone())
            .map_err(|e| ServerError::Config(format!("integration {:?}: {e}", seed.name)))?;
        if !provider.validate_config() {
            warn!(
                integration = %seed.name,
                kind = %seed.integration_type,
                required = ?provider.required_keys(),
                "integration config is missing required keys"
            );
        }

        let mut integration =
            Integration::new(&seed.name, &seed.integration_type, seed.config.clone());
        integration.is_active = seed.active;
        store.create_integration(integration).await?;
        summary.integrations += 1;
    }

    for seed in &config.audiences {
        let mut audience =
            Audience::new(&seed.name, seed.audience_type).with_description(&seed.description);
        audience.is_active = seed.active;
        let audience = store.create_audience(audience).await?;
        summary.audiences += 1;

        for link_seed in &seed.integrations {
            let integration = store
                .find_integration_by_name(&link_seed.name)
                .await?
                .ok_or_else(|| {
                    ServerError::Config(format!(
                        "audience {:?} links undeclared integration {:?}",
                        seed.name, link_seed.name
                    ))
                })?;
            let mut link = AudienceIntegration::new(
                audience.id.clone(),
                integration.id,
                link_seed.settings.clone(),
            );
            link.is_active = link_seed.active;
            store.link_integration(link).await?;
            summary.links += 1;
        }
    }

    info!(
        integrations = summary.integrations,
        audiences = summary.audiences,
        links = summary.links,
        "seed data loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use herald_dispatch::builtin_registry;
    use herald_store_memory::MemoryEntityStore;

    use super::*;

    fn config(toml: &str) -> HeraldConfig {
        HeraldConfig::from_toml(toml).unwrap()
    }

    #[tokio::test]
    async fn seeds_integrations_audiences_and_links() {
        let store = MemoryEntityStore::new();
        let cfg = config(
            r#"
            [[integrations]]
            name = "alerts"
            type = "ntfy"
            config = { topic = "signups" }

            [[integrations]]
            name = "crm"
            type = "loops"
            config = { api_key = "k" }

            [[audiences]]
            name = "Launch"
            type = "waitlist"

            [[audiences.integrations]]
            name = "alerts"
            settings = { topic = "launch" }

            [[audiences.integrations]]
            name = "crm"
            active = false
            "#,
        );

        let summary = load_seeds(&cfg, &store, &builtin_registry().unwrap()).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                integrations: 2,
                audiences: 1,
                links: 2
            }
        );

        let audience = store.list_audiences().await.unwrap().remove(0);
        let links = store.active_links(&audience.id).await.unwrap();
        assert_eq!(links.len(), 1);
        let (link, integration) = &links[0];
        assert_eq!(integration.name, "alerts");
        assert_eq!(link.settings["topic"], "launch");
    }

    #[tokio::test]
    async fn unknown_integration_type_is_a_startup_error() {
        let store = MemoryEntityStore::new();
        let cfg = config(
            r#"
            [[integrations]]
            name = "carrier"
            type = "pigeon"
            "#,
        );
        let err = load_seeds(&cfg, &store, &builtin_registry().unwrap()).await.unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("pigeon"));
        assert!(store.list_integrations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn link_to_undeclared_integration_is_rejected() {
        let store = MemoryEntityStore::new();
        let cfg = config(
            r#"
            [[audiences]]
            name = "Launch"
            type = "newsletter"

            [[audiences.integrations]]
            name = "ghost"
            "#,
        );
        let err = load_seeds(&cfg, &store, &builtin_registry().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[tokio::test]
    async fn incomplete_config_is_loaded_with_a_warning() {
        let store = MemoryEntityStore::new();
        let cfg = config(
            r#"
            [[integrations]]
            name = "mail"
            type = "smtp"
            config = { host = "localhost" }
            "#,
        );
        let summary = load_seeds(&cfg, &store, &builtin_registry().unwrap()).await.unwrap();
        assert_eq!(summary.integrations, 1);
    }

    #[tokio::test]
    async fn duplicate_integration_names_are_rejected() {
        let store = MemoryEntityStore::new();
        let cfg = config(
            r#"
            [[integrations]]
            name = "alerts"
            type = "ntfy"

            [[integrations]]
            name = "alerts"
            type = "ntfy"
            "#,
        );
        let err = load_seeds(&cfg, &store, &builtin_registry().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
