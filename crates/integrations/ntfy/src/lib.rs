//! Push-notification provider for Herald.
//!
//! Publishes a plain-text summary of each new subscriber to an ntfy topic,
//! titled `New Subscriber: <email>` (or a custom `MiniJinja` title) and
//! tagged `incoming_envelope`. Summaries can be rendered in English or
//! Spanish via the `language` key.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{DEFAULT_SERVER_URL, KIND, config_schema};
pub use error::NtfyError;
pub use provider::NtfyProvider;
pub use types::{NtfyMessage, build_message};
