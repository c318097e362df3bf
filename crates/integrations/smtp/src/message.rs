use herald_core::{SubscriberContext, SubscriberSummary};
use herald_provider::ProviderError;
use lettre::Message;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};

use crate::config::SmtpSettings;

/// Build the `multipart/alternative` notification e-mail.
pub fn build_message(settings: &SmtpSettings, ctx: &SubscriberContext) -> Result<Message, ProviderError> {
    let from: Mailbox = settings
        .from_email
        .parse()
        .map_err(|e| ProviderError::Configuration(format!("invalid from address: {e}")))?;
    let to: Mailbox = settings
        .to_email
        .parse()
        .map_err(|e| ProviderError::Configuration(format!("invalid recipient address: {e}")))?;

    let summary = SubscriberSummary::new(ctx, settings.language);
    let text = summary.to_plain_text_with_heading();
    let html = summary.to_html()?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(summary.title())
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html),
                ),
        )
        .map_err(|e| ProviderError::Serialization(format!("failed to build email: {e}")))
}

#[cfg(test)]
mod tests {
    use herald_core::{Audience, AudienceType, Language, Subscriber};

    use super::*;

    fn settings(to: &str) -> SmtpSettings {
        SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: None,
            password: None,
            use_tls: false,
            from_email: "alerts@example.com".into(),
            to_email: to.into(),
            language: Language::En,
        }
    }

    fn context() -> SubscriberContext {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "a@b.com");
        SubscriberContext::new(subscriber, audience, None)
    }

    #[test]
    fn builds_multipart_message() {
        let message = build_message(&settings("ops@example.com"), &context()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New Subscriber: a@b.com"));
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn invalid_recipient_is_configuration_error() {
        let err = build_message(&settings("not-an-address"), &context()).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }
}
