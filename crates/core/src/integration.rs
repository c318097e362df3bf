use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AudienceId, ConfigMap, IntegrationId, LinkId};

/// A configured instance of a provider kind.
///
/// `integration_type` is the registry key of the provider that executes it;
/// `config` is the provider-defined map validated against that provider's
/// required keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    pub id: IntegrationId,
    pub name: String,
    pub integration_type: String,
    #[serde(default)]
    pub config: ConfigMap,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Integration {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        integration_type: impl Into<String>,
        config: ConfigMap,
    ) -> Self {
        Self {
            id: IntegrationId::generate(),
            name: name.into(),
            integration_type: integration_type.into(),
            config,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Binds an integration to an audience. This is the unit of dispatch.
///
/// `settings` carries per-audience overrides; each provider documents which
/// keys it honours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceIntegration {
    pub id: LinkId,
    pub audience_id: AudienceId,
    pub integration_id: IntegrationId,
    #[serde(default)]
    pub settings: ConfigMap,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AudienceIntegration {
    #[must_use]
    pub fn new(audience_id: AudienceId, integration_id: IntegrationId, settings: ConfigMap) -> Self {
        Self {
            id: LinkId::generate(),
            audience_id,
            integration_id,
            settings,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Settings as passed to a provider: `None` when no override is present.
    pub fn settings_override(&self) -> Option<&ConfigMap> {
        if self.settings.is_empty() {
            None
        } else {
            Some(&self.settings)
        }
    }
}
