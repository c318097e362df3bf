use herald_core::{AudienceType, ConfigMap};
use serde::Deserialize;

/// An integration loaded into the store at startup.
///
/// # Example
///
/// ```toml
/// [[integrations]]
/// name = "signup-alerts"
/// type = "ntfy"
///
/// [integrations.config]
/// topic = "signups"
/// language = "es"
/// ```
#[derive(Debug, Deserialize)]
pub struct IntegrationSeed {
    /// Unique name, referenced by audience links.
    pub name: String,
    /// Provider kind: `"loops"`, `"ntfy"`, or `"smtp"`.
    #[serde(rename = "type")]
    pub integration_type: String,
    /// Provider-defined configuration map.
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// An audience loaded into the store at startup, with its integration links.
///
/// # Example
///
/// ```toml
/// [[audiences]]
/// name = "Launch"
/// type = "waitlist"
///
/// [[audiences.integrations]]
/// name = "signup-alerts"
/// settings = { topic = "launch-signups" }
/// ```
#[derive(Debug, Deserialize)]
pub struct AudienceSeed {
    pub name: String,
    #[serde(rename = "type")]
    pub audience_type: AudienceType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub integrations: Vec<LinkSeed>,
}

/// A link from a seeded audience to a seeded integration.
#[derive(Debug, Deserialize)]
pub struct LinkSeed {
    /// Name of an entry in `[[integrations]]`.
    pub name: String,
    /// Per-audience overrides passed to the provider.
    #[serde(default)]
    pub settings: ConfigMap,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}
