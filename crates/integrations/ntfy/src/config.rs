use herald_core::ConfigMap;
use serde_json::json;

/// Registry key of the push-notification provider.
pub const KIND: &str = "ntfy";

pub const DEFAULT_SERVER_URL: &str = "https://ntfy.sh";

pub const REQUIRED_KEYS: &[&str] = &["topic"];

/// Emoji tag attached to every notification.
pub const TAGS: &str = "incoming_envelope";

/// Example configuration shown to administrators.
///
/// `language` and `title` may also be set per audience, as may `topic`.
pub fn config_schema() -> ConfigMap {
    let mut schema = ConfigMap::new();
    schema.insert("topic".into(), json!("your-topic-name"));
    schema.insert("server_url".into(), json!(DEFAULT_SERVER_URL));
    schema.insert("access_token".into(), json!(""));
    schema.insert("language".into(), json!("en"));
    schema.insert("title".into(), json!(""));
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_defaults() {
        let schema = config_schema();
        assert_eq!(schema["server_url"], "https://ntfy.sh");
        assert_eq!(schema["access_token"], "");
        assert!(schema.contains_key("topic"));
    }
}
