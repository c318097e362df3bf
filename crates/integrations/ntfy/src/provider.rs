use std::time::Duration;

use herald_core::{ConfigMap, SubscriberContext};
use herald_provider::config::require_keys;
use herald_provider::{Provider, ProviderError};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::config::{self, KIND, REQUIRED_KEYS, TAGS};
use crate::error::NtfyError;
use crate::types::{NtfyMessage, build_message};

/// Push-notification provider publishing one message per new subscriber.
pub struct NtfyProvider {
    config: ConfigMap,
    client: Client,
}

impl NtfyProvider {
    /// Builds a private client with a 30 s request timeout.
    pub fn new(config: ConfigMap) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn with_client(config: ConfigMap, client: Client) -> Self {
        Self { config, client }
    }

    async fn publish(&self, message: &NtfyMessage) -> Result<Value, NtfyError> {
        debug!(url = %message.url, title = %message.title, "publishing ntfy message");

        let mut request = self
            .client
            .post(&message.url)
            .header("Title", message.title.as_str())
            .header("Tags", TAGS)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(message.body.clone());
        if let Some(token) = &message.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "ntfy server returned an error status");
            return Err(NtfyError::UnexpectedStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }
}

impl Provider for NtfyProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn kind(&self) -> &str {
        KIND
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn required_keys(&self) -> &'static [&'static str] {
        REQUIRED_KEYS
    }

    fn config_schema(&self) -> ConfigMap {
        config::config_schema()
    }

    #[instrument(skip_all, fields(provider = KIND, subscriber_id = %ctx.subscriber.id))]
    async fn execute(
        &self,
        ctx: &SubscriberContext,
        settings: Option<&ConfigMap>,
    ) -> Result<Value, ProviderError> {
        require_keys(KIND, &self.config, REQUIRED_KEYS)?;

        let message = build_message(&self.config, ctx, settings)?;
        let published = self.publish(&message).await?;

        info!(topic = %message.topic, "ntfy notification sent");
        Ok(json!({
            "success": true,
            "topic": message.topic,
            "id": published.get("id").cloned().unwrap_or(Value::Null),
        }))
    }
}
