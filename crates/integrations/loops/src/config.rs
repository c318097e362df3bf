use herald_core::ConfigMap;
use serde_json::json;

/// Registry key of the contact-sync provider.
pub const KIND: &str = "loops";

/// Contact creation endpoint of the Loops API.
pub const DEFAULT_ENDPOINT: &str = "https://app.loops.so/api/v1/contacts/create";

pub const REQUIRED_KEYS: &[&str] = &["api_key"];

/// Audience settings key whose object value is merged into the contact payload.
pub const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// Example configuration shown to administrators.
pub fn config_schema() -> ConfigMap {
    let mut schema = ConfigMap::new();
    schema.insert("api_key".into(), json!("your-loops-api-key"));
    schema
}
