use std::sync::Arc;

use herald_core::{ConfigMap, SubscriberContext};
use herald_loops::LoopsProvider;
use herald_ntfy::NtfyProvider;
use herald_provider::{Provider, ProviderDescriptor, ProviderError, ProviderRegistry};
use herald_smtp::SmtpProvider;
use reqwest::Client;

/// The provider kinds shipped with Herald.
///
/// Each variant wraps its concrete provider and delegates every
/// [`Provider`] call to it.
pub enum BuiltinProvider {
    Loops(LoopsProvider),
    Ntfy(NtfyProvider),
    Smtp(SmtpProvider),
}

impl BuiltinProvider {
    /// Kind keys of all built-in providers, sorted.
    pub const KINDS: [&'static str; 3] = [herald_loops::KIND, herald_ntfy::KIND, herald_smtp::KIND];

    /// Build the built-in provider registered under `kind`.
    ///
    /// HTTP providers send through `client`, so every provider built from
    /// the same registry shares one connection pool.
    pub fn from_kind(
        kind: &str,
        config: ConfigMap,
        client: &Client,
    ) -> Result<Self, ProviderError> {
        match kind {
            herald_loops::KIND => Ok(Self::Loops(LoopsProvider::with_client(
                config,
                client.clone(),
            ))),
            herald_ntfy::KIND => Ok(Self::Ntfy(NtfyProvider::with_client(config, client.clone()))),
            herald_smtp::KIND => Ok(Self::Smtp(SmtpProvider::new(config))),
            other => Err(ProviderError::NotFound(other.to_owned())),
        }
    }
}

impl Provider for BuiltinProvider {
    fn kind(&self) -> &str {
        match self {
            Self::Loops(p) => p.kind(),
            Self::Ntfy(p) => p.kind(),
            Self::Smtp(p) => p.kind(),
        }
    }

    fn config(&self) -> &ConfigMap {
        match self {
            Self::Loops(p) => p.config(),
            Self::Ntfy(p) => p.config(),
            Self::Smtp(p) => p.config(),
        }
    }

    fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Loops(p) => p.required_keys(),
            Self::Ntfy(p) => p.required_keys(),
            Self::Smtp(p) => p.required_keys(),
        }
    }

    fn config_schema(&self) -> ConfigMap {
        match self {
            Self::Loops(p) => p.config_schema(),
            Self::Ntfy(p) => p.config_schema(),
            Self::Smtp(p) => p.config_schema(),
        }
    }

    async fn execute(
        &self,
        ctx: &SubscriberContext,
        settings: Option<&ConfigMap>,
    ) -> Result<serde_json::Value, ProviderError> {
        match self {
            Self::Loops(p) => p.execute(ctx, settings).await,
            Self::Ntfy(p) => p.execute(ctx, settings).await,
            Self::Smtp(p) => p.execute(ctx, settings).await,
        }
    }
}

fn descriptor(
    kind: &'static str,
    schema: fn() -> ConfigMap,
    client: &Client,
) -> ProviderDescriptor {
    let client = client.clone();
    ProviderDescriptor::new(kind, schema, move |config| {
        let provider: Arc<dyn herald_provider::DynProvider> =
            Arc::new(BuiltinProvider::from_kind(kind, config, &client)?);
        Ok(provider)
    })
}

/// Build the HTTP client shared by the built-in HTTP providers.
///
/// No request timeout is set: the dispatch pipeline bounds each call.
pub fn shared_http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .build()
        .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Create a registry holding every built-in provider kind.
///
/// Call once at startup; register any additional kinds on the returned
/// registry before freezing it behind an `Arc`.
pub fn builtin_registry() -> Result<ProviderRegistry, ProviderError> {
    Ok(builtin_registry_with_client(&shared_http_client()?))
}

/// Like [`builtin_registry`], sending HTTP through the given client.
pub fn builtin_registry_with_client(client: &Client) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(descriptor(herald_loops::KIND, herald_loops::config_schema, client));
    registry.register(descriptor(herald_ntfy::KIND, herald_ntfy::config_schema, client));
    registry.register(descriptor(herald_smtp::KIND, herald_smtp::config_schema, client));
    registry
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use herald_core::{Audience, AudienceType, Subscriber};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn registry_lists_builtin_kinds() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.kinds(), vec!["loops", "ntfy", "smtp"]);
        assert_eq!(registry.kinds(), BuiltinProvider::KINDS.to_vec());
    }

    #[test]
    fn schemas_come_from_the_provider_crates() {
        let registry = builtin_registry().unwrap();
        let smtp = registry.config_schema("smtp").unwrap();
        assert!(smtp.contains_key("host"));
        assert!(smtp.contains_key("from_email"));
        let ntfy = registry.config_schema("ntfy").unwrap();
        assert!(ntfy.contains_key("topic"));
        assert!(registry.config_schema("pigeon").is_none());
    }

    #[test]
    fn build_unknown_kind_is_not_found() {
        let registry = builtin_registry().unwrap();
        let err = registry.build("pigeon", ConfigMap::new()).err().unwrap();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert_eq!(err.to_string(), "unknown integration type: pigeon");
    }

    #[test]
    fn built_provider_reports_its_kind() {
        let registry = builtin_registry().unwrap();
        let provider = registry.build("ntfy", ConfigMap::new()).unwrap();
        assert_eq!(provider.kind(), "ntfy");
        assert!(!provider.validate_config());
    }

    #[test]
    fn enum_delegates_to_the_wrapped_provider() {
        let mut config = ConfigMap::new();
        config.insert("api_key".into(), serde_json::json!("k"));
        let client = shared_http_client().unwrap();
        let provider = BuiltinProvider::from_kind("loops", config, &client).unwrap();
        assert_eq!(Provider::kind(&provider), "loops");
        assert_eq!(Provider::required_keys(&provider), &["api_key"]);
        assert!(Provider::validate_config(&provider));
    }

    fn context() -> SubscriberContext {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "a@b.com");
        SubscriberContext::new(subscriber, audience, None)
    }

    /// A peer that accepts connections and never answers must be cut off by
    /// the caller's deadline, even one well past 30 seconds.
    #[tokio::test(start_paused = true)]
    async fn http_providers_have_no_client_side_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        let _silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let registry = builtin_registry().unwrap();
        let mut config = ConfigMap::new();
        config.insert("topic".into(), json!("signups"));
        config.insert("server_url".into(), json!(server_url));
        let provider = registry.build("ntfy", config).unwrap();

        let ctx = context();
        let started = tokio::time::Instant::now();
        let outcome =
            tokio::time::timeout(Duration::from_secs(120), provider.execute(&ctx, None)).await;

        assert!(outcome.is_err(), "provider returned early: {outcome:?}");
        assert!(started.elapsed() >= Duration::from_secs(120));
    }
}
