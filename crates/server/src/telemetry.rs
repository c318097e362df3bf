//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins when set; otherwise the `[logging] level` directive from
//! the config file is used.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// Resolve the filter: `RUST_LOG`, then the configured level, then `info`.
///
/// Returns the filter and, when the configured level could not be parsed,
/// the rejected directive.
fn env_filter(config: &LoggingConfig) -> (EnvFilter, Option<String>) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, None);
    }
    match EnvFilter::try_new(&config.level) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new("info"), Some(config.level.clone())),
    }
}

/// Install the global tracing subscriber. Call once, before any tracing.
pub fn init(config: &LoggingConfig) {
    let (filter, rejected) = env_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if let Some(level) = rejected {
        tracing::warn!(%level, "invalid logging level, falling back to info");
    }
}
