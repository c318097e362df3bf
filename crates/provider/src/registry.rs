use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use herald_core::ConfigMap;

use crate::error::ProviderError;
use crate::provider::DynProvider;

/// Builds a provider instance from an integration's stored config.
pub type ProviderFactory =
    Arc<dyn Fn(ConfigMap) -> Result<Arc<dyn DynProvider>, ProviderError> + Send + Sync>;

/// Everything the registry knows about one provider kind.
#[derive(Clone)]
pub struct ProviderDescriptor {
    kind: String,
    schema: fn() -> ConfigMap,
    factory: ProviderFactory,
}

impl ProviderDescriptor {
    pub fn new<F>(kind: impl Into<String>, schema: fn() -> ConfigMap, factory: F) -> Self
    where
        F: Fn(ConfigMap) -> Result<Arc<dyn DynProvider>, ProviderError> + Send + Sync + 'static,
    {
        Self {
            kind: kind.into(),
            schema,
            factory: Arc::new(factory),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn schema(&self) -> ConfigMap {
        (self.schema)()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Maps integration type keys to provider descriptors.
///
/// The registry is populated once at startup, before serving traffic, and is
/// then shared read-only behind an `Arc`. Nothing about it is persisted.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider kind. An existing kind with the same key is replaced.
    pub fn register(&mut self, descriptor: ProviderDescriptor) {
        self.providers.insert(descriptor.kind.clone(), descriptor);
    }

    /// Instantiate the provider for `kind` with the given stored config.
    pub fn build(&self, kind: &str, config: ConfigMap) -> Result<Arc<dyn DynProvider>, ProviderError> {
        let descriptor = self
            .providers
            .get(kind)
            .ok_or_else(|| ProviderError::NotFound(kind.to_owned()))?;
        (descriptor.factory)(config)
    }

    /// The config schema for `kind`, or `None` for an unknown kind.
    pub fn config_schema(&self, kind: &str) -> Option<ConfigMap> {
        self.providers.get(kind).map(ProviderDescriptor::schema)
    }

    /// Schemas of all registered kinds, keyed by kind.
    pub fn schemas(&self) -> BTreeMap<String, ConfigMap> {
        self.providers
            .iter()
            .map(|(kind, d)| (kind.clone(), d.schema()))
            .collect()
    }

    /// Sorted list of registered kinds.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.providers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
