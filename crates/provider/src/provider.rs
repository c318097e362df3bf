use async_trait::async_trait;
use herald_core::{ConfigMap, SubscriberContext};

use crate::config::missing_keys;
use crate::error::ProviderError;

/// Strongly-typed provider trait with native `async fn`.
///
/// A provider is one configured instance of an integration kind: it owns the
/// integration's stored config and delivers a subscriber to one external
/// system. This trait is **not** object-safe; use [`DynProvider`] for dynamic
/// dispatch. Every `Provider` implements `DynProvider` via a blanket impl.
pub trait Provider: Send + Sync {
    /// Registry key of this provider kind (e.g. `"smtp"`).
    fn kind(&self) -> &str;

    /// The stored integration config this instance was built from.
    fn config(&self) -> &ConfigMap;

    /// Config keys that must be present for [`validate_config`](Self::validate_config).
    fn required_keys(&self) -> &'static [&'static str];

    /// Template of expected config keys with example values.
    fn config_schema(&self) -> ConfigMap;

    /// Returns `true` iff every required key is present in the config.
    ///
    /// Presence only: no type, format, or reachability checks.
    fn validate_config(&self) -> bool {
        missing_keys(self.config(), self.required_keys()).is_empty()
    }

    /// Deliver the subscriber, applying any per-audience `settings` overrides.
    ///
    /// Implementations must fail with [`ProviderError::Configuration`] before
    /// any I/O when the config is invalid.
    fn execute(
        &self,
        ctx: &SubscriberContext,
        settings: Option<&ConfigMap>,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ProviderError>> + Send;
}

/// Object-safe provider trait for use behind `Arc<dyn DynProvider>`.
///
/// You generally should not implement this trait directly; implement
/// [`Provider`] and rely on the blanket implementation.
#[async_trait]
pub trait DynProvider: Send + Sync {
    fn kind(&self) -> &str;

    fn config(&self) -> &ConfigMap;

    fn required_keys(&self) -> &'static [&'static str];

    fn config_schema(&self) -> ConfigMap;

    fn validate_config(&self) -> bool;

    async fn execute(
        &self,
        ctx: &SubscriberContext,
        settings: Option<&ConfigMap>,
    ) -> Result<serde_json::Value, ProviderError>;
}

#[async_trait]
impl<T: Provider + Sync> DynProvider for T {
    fn kind(&self) -> &str {
        Provider::kind(self)
    }

    fn config(&self) -> &ConfigMap {
        Provider::config(self)
    }

    fn required_keys(&self) -> &'static [&'static str] {
        Provider::required_keys(self)
    }

    fn config_schema(&self) -> ConfigMap {
        Provider::config_schema(self)
    }

    fn validate_config(&self) -> bool {
        Provider::validate_config(self)
    }

    async fn execute(
        &self,
        ctx: &SubscriberContext,
        settings: Option<&ConfigMap>,
    ) -> Result<serde_json::Value, ProviderError> {
        Provider::execute(self, ctx, settings).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_core::{Audience, AudienceType, Subscriber};
    use serde_json::json;

    use super::*;
    use crate::config::require_keys;

    struct MockProvider {
        config: ConfigMap,
        should_fail: bool,
    }

    impl MockProvider {
        fn new(config: serde_json::Value, should_fail: bool) -> Self {
            let serde_json::Value::Object(config) = config else {
                unreachable!()
            };
            Self {
                config,
                should_fail,
            }
        }
    }

    impl Provider for MockProvider {
        fn kind(&self) -> &str {
            "mock"
        }

        fn config(&self) -> &ConfigMap {
            &self.config
        }

        fn required_keys(&self) -> &'static [&'static str] {
            &["endpoint"]
        }

        fn config_schema(&self) -> ConfigMap {
            let mut schema = ConfigMap::new();
            schema.insert("endpoint".into(), json!("https://example.com"));
            schema
        }

        async fn execute(
            &self,
            ctx: &SubscriberContext,
            _settings: Option<&ConfigMap>,
        ) -> Result<serde_json::Value, ProviderError> {
            require_keys("mock", &self.config, Provider::required_keys(self))?;
            if self.should_fail {
                return Err(ProviderError::Rejected("mock failure".into()));
            }
            Ok(json!({"delivered": ctx.email()}))
        }
    }

    fn context() -> SubscriberContext {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "a@b.com");
        SubscriberContext::new(subscriber, audience, None)
    }

    #[test]
    fn validate_config_checks_presence() {
        let valid = MockProvider::new(json!({"endpoint": ""}), false);
        assert!(Provider::validate_config(&valid));
        let invalid = MockProvider::new(json!({}), false);
        assert!(!Provider::validate_config(&invalid));
    }

    #[tokio::test]
    async fn provider_execute_success() {
        let provider = MockProvider::new(json!({"endpoint": "x"}), false);
        let resp = Provider::execute(&provider, &context(), None).await.unwrap();
        assert_eq!(resp["delivered"], "a@b.com");
    }

    #[tokio::test]
    async fn provider_execute_invalid_config() {
        let provider = MockProvider::new(json!({}), false);
        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("endpoint"));
    }

    #[tokio::test]
    async fn blanket_dyn_provider_impl() {
        let provider: Arc<dyn DynProvider> =
            Arc::new(MockProvider::new(json!({"endpoint": "x"}), true));
        assert_eq!(provider.kind(), "mock");
        assert!(provider.validate_config());
        assert!(provider.config_schema().contains_key("endpoint"));

        let err = provider.execute(&context(), None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Rejected(_)));
    }
}
