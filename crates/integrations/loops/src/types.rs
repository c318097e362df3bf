use herald_core::{ConfigMap, SubscriberContext};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::CUSTOM_FIELDS_KEY;

/// Fallback message when the API reports failure without explanation.
pub const UNKNOWN_ERROR: &str = "Unknown error from Loops API";

/// Build the contact creation body for a subscriber.
///
/// Missing names are sent as empty strings and a missing source as `null`.
/// An object under `custom_fields` in the audience settings is merged in last,
/// so it may override the standard fields.
pub fn build_payload(ctx: &SubscriberContext, settings: Option<&ConfigMap>) -> ConfigMap {
    let sub = &ctx.subscriber;
    let mut payload = ConfigMap::new();
    payload.insert("email".into(), json!(sub.email));
    payload.insert(
        "firstName".into(),
        json!(sub.first_name.as_deref().unwrap_or_default()),
    );
    payload.insert(
        "lastName".into(),
        json!(sub.last_name.as_deref().unwrap_or_default()),
    );
    payload.insert("source".into(), json!(ctx.source_domain()));

    match settings.and_then(|s| s.get(CUSTOM_FIELDS_KEY)) {
        Some(Value::Object(fields)) => {
            for (key, value) in fields {
                payload.insert(key.clone(), value.clone());
            }
        }
        Some(Value::Null) | None => {}
        Some(_) => warn!("ignoring non-object custom_fields setting"),
    }

    payload
}

/// The `message` field of an API response, if any.
pub fn api_message(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}

/// Whether the response body reports success.
pub fn is_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(true)
}

#[cfg(test)]
mod tests {
    use herald_core::{Audience, AudienceType, Source, Subscriber};

    use super::*;

    fn context(source: Option<&str>) -> SubscriberContext {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "a@b.com").with_name("A", "B");
        SubscriberContext::new(subscriber, audience, source.map(Source::new))
    }

    #[test]
    fn payload_without_source() {
        let payload = build_payload(&context(None), None);
        assert_eq!(
            Value::Object(payload),
            json!({"email": "a@b.com", "firstName": "A", "lastName": "B", "source": null})
        );
    }

    #[test]
    fn payload_with_source_and_custom_fields() {
        let settings = json!({"custom_fields": {"plan": "pro", "source": "landing"}});
        let payload = build_payload(&context(Some("example.com")), settings.as_object());
        assert_eq!(payload["plan"], "pro");
        assert_eq!(payload["source"], "landing");
    }

    #[test]
    fn missing_names_are_empty_strings() {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "x@y.org");
        let ctx = SubscriberContext::new(subscriber, audience, Some(Source::new("site.io")));
        let payload = build_payload(&ctx, None);
        assert_eq!(payload["firstName"], "");
        assert_eq!(payload["lastName"], "");
        assert_eq!(payload["source"], "site.io");
    }

    #[test]
    fn non_object_custom_fields_ignored() {
        let settings = json!({"custom_fields": "plan=pro"});
        let payload = build_payload(&context(None), settings.as_object());
        assert_eq!(payload.len(), 4);
    }

    #[test]
    fn success_flag() {
        assert!(is_success(&json!({"success": true, "id": "c1"})));
        assert!(!is_success(&json!({"success": false})));
        assert!(!is_success(&json!({"id": "c1"})));
        assert_eq!(api_message(&json!({"message": "x"})), Some("x"));
    }
}
