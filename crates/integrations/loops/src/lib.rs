//! Contact-sync provider for Herald.
//!
//! Every new subscriber becomes a contact in a Loops account. The provider
//! posts `{email, firstName, lastName, source}` to the contact creation
//! endpoint with a bearer API key and treats the call as successful only when
//! the API answers 2xx with `"success": true`.
//!
//! ```rust,no_run
//! use herald_loops::LoopsProvider;
//! use serde_json::json;
//!
//! let config = json!({"api_key": "your-loops-api-key"});
//! let _provider = LoopsProvider::new(config.as_object().cloned().unwrap_or_default());
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{DEFAULT_ENDPOINT, KIND, config_schema};
pub use error::LoopsError;
pub use provider::LoopsProvider;
pub use types::build_payload;
