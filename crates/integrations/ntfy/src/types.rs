use herald_core::{ConfigMap, Language, SubscriberContext, SubscriberSummary, render_title_template};
use herald_provider::ProviderError;
use herald_provider::config::{get_str, setting_or_config};

use crate::config::DEFAULT_SERVER_URL;

/// A fully resolved notification, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtfyMessage {
    pub url: String,
    pub topic: String,
    pub title: String,
    pub body: String,
    pub access_token: Option<String>,
}

/// Resolve topic, language, and title, then render the notification.
///
/// `topic`, `language`, and `title` may be overridden by audience settings;
/// the server URL and access token come from the stored config only.
pub fn build_message(
    config: &ConfigMap,
    ctx: &SubscriberContext,
    settings: Option<&ConfigMap>,
) -> Result<NtfyMessage, ProviderError> {
    let topic = setting_or_config(settings, config, "topic")
        .ok_or_else(|| ProviderError::Configuration("ntfy topic is empty".into()))?
        .to_owned();
    let server_url = get_str(config, "server_url").unwrap_or(DEFAULT_SERVER_URL);
    let language = Language::resolve(setting_or_config(settings, config, "language"));

    let summary = SubscriberSummary::new(ctx, language);
    let title = match setting_or_config(settings, config, "title") {
        Some(template) => render_title_template(template, ctx)?,
        None => summary.title().to_owned(),
    };

    Ok(NtfyMessage {
        url: format!("{}/{topic}", server_url.trim_end_matches('/')),
        topic,
        title: sanitize_header(&title),
        body: summary.to_plain_text(),
        access_token: get_str(config, "access_token").map(str::to_owned),
    })
}

/// Header values cannot carry line breaks.
fn sanitize_header(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}
