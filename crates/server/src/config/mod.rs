mod dispatch;
mod logging;
mod seeds;
mod server;


pub use dispatch::*;
pub use logging::*;
pub use seeds::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Herald server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct HeraldConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Dispatch worker configuration.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Integrations created at startup.
    #[serde(default)]
    pub integrations: Vec<IntegrationSeed>,
    /// Audiences (and their integration links) created at startup.
    #[serde(default)]
    pub audiences: Vec<AudienceSeed>,
}

impl HeraldConfig {
    /// Parse a configuration document.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load the configuration file at `path`, or defaults when it does not
    /// exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}
