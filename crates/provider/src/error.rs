use std::fmt;
use std::time::Duration;

use herald_core::RenderError;
use thiserror::Error;

/// Errors that can occur while resolving or executing a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider is registered under the requested kind.
    #[error("unknown integration type: {0}")]
    NotFound(String),

    /// Missing or invalid configuration, detected before any I/O.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// HTTP non-2xx, connection failure, or SMTP protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider accepted the request but reported failure.
    #[error("rejected by provider: {0}")]
    Rejected(String),

    /// The dispatch-level time bound expired.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse failure class used in logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Transport,
    Semantic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Semantic => "semantic",
        })
    }
}

impl ProviderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Transport(_) | Self::Timeout(_) => ErrorCategory::Transport,
            Self::Rejected(_) | Self::Serialization(_) => ErrorCategory::Semantic,
        }
    }
}

impl From<RenderError> for ProviderError {
    fn from(err: RenderError) -> Self {
        Self::Configuration(err.to_string())
    }
}
