use std::time::Duration;

use herald_core::{ConfigMap, SubscriberContext};
use herald_provider::config::require_keys;
use herald_provider::{Provider, ProviderError};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::{self, DEFAULT_ENDPOINT, KIND, REQUIRED_KEYS};
use crate::error::LoopsError;
use crate::types::{UNKNOWN_ERROR, api_message, build_payload, is_success};

/// Contact-sync provider that creates a contact per new subscriber.
///
/// Audience settings may supply `custom_fields`, an object merged into the
/// contact payload.
pub struct LoopsProvider {
    config: ConfigMap,
    endpoint: String,
    client: Client,
}

impl LoopsProvider {
    /// Create a provider from an integration's stored config.
    ///
    /// Builds a private client with a 30 s request timeout. Prefer
    /// [`LoopsProvider::with_client`] when building many providers.
    pub fn new(config: ConfigMap) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a provider with a custom HTTP client.
    pub fn with_client(config: ConfigMap, client: Client) -> Self {
        Self {
            config,
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            client,
        }
    }

    /// Override the contact creation URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn api_key(&self) -> &str {
        self.config
            .get("api_key")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    async fn create_contact(&self, payload: &ConfigMap) -> Result<Value, LoopsError> {
        debug!(url = %self.endpoint, "creating Loops contact");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = body
                .as_ref()
                .and_then(api_message)
                .map_or(text.clone(), str::to_owned);
            warn!(status = status.as_u16(), %message, "Loops API returned an error status");
            return Err(LoopsError::UnexpectedStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body = body.ok_or_else(|| {
            LoopsError::InvalidResponse(format!("expected JSON body, got: {text}"))
        })?;

        if !is_success(&body) {
            let message = api_message(&body).unwrap_or(UNKNOWN_ERROR);
            return Err(LoopsError::Api(message.to_owned()));
        }

        Ok(body)
    }
}

impl Provider for LoopsProvider {
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

        let payload = build_payload(ctx, settings);
        let body = self.create_contact(&payload).await?;

        info!(email = %ctx.email(), "Loops contact created");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use herald_core::{Audience, AudienceType, Subscriber};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// A minimal mock HTTP server built on tokio that returns canned responses.
    struct MockLoopsServer {
        listener: TcpListener,
        base_url: String,
    }

    impl MockLoopsServer {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}");
            Self { listener, base_url }
        }

        fn endpoint(&self) -> String {
            format!("{}/api/v1/contacts/create", self.base_url)
        }

        /// Accept one connection, respond with the given status and JSON body,
        /// and return the raw request text.
        async fn respond_once(self, status_code: u16, body: &str) -> String {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        }
    }

    /// Read headers plus a `Content-Length` body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request_body(request: &str) -> Value {
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn context() -> SubscriberContext {
        let audience = Audience::new("Launch", AudienceType::Waitlist);
        let subscriber = Subscriber::new(audience.id.clone(), "a@b.com").with_name("A", "B");
        SubscriberContext::new(subscriber, audience, None)
    }

    fn config(value: Value) -> ConfigMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn provider_kind() {
        let provider = LoopsProvider::new(config(json!({"api_key": "k"}))).unwrap();
        assert_eq!(Provider::kind(&provider), "loops");
        assert!(Provider::validate_config(&provider));
    }

    #[tokio::test]
    async fn execute_success() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(config(json!({"api_key": "key-1"})))
            .unwrap()
            .with_endpoint(server.endpoint());

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(200, r#"{"success":true,"id":"contact-9"}"#)
                .await
        });

        let result = Provider::execute(&provider, &context(), None).await;
        let request = server_handle.await.unwrap();

        let body = result.expect("execute should succeed");
        assert_eq!(body["id"], "contact-9");

        assert!(request.starts_with("POST /api/v1/contacts/create "));
        assert!(request.to_lowercase().contains("authorization: bearer key-1"));
        assert_eq!(
            request_body(&request),
            json!({"email": "a@b.com", "firstName": "A", "lastName": "B", "source": null})
        );
    }

    #[tokio::test]
    async fn execute_merges_custom_fields() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(config(json!({"api_key": "key-1"})))
            .unwrap()
            .with_endpoint(server.endpoint());
        let settings = config(json!({"custom_fields": {"plan": "pro"}}));

        let server_handle =
            tokio::spawn(async move { server.respond_once(200, r#"{"success":true}"#).await });

        Provider::execute(&provider, &context(), Some(&settings))
            .await
            .unwrap();
        let request = server_handle.await.unwrap();
        assert_eq!(request_body(&request)["plan"], "pro");
    }

    #[tokio::test]
    async fn success_false_is_rejected() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(config(json!({"api_key": "key-1"})))
            .unwrap()
            .with_endpoint(server.endpoint());

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(200, r#"{"success":false,"message":"x"}"#)
                .await
        });

        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, ProviderError::Rejected(_)));
        assert!(err.to_string().contains("Loops API error: x"));
    }

    #[tokio::test]
    async fn success_false_without_message() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(config(json!({"api_key": "key-1"})))
            .unwrap()
            .with_endpoint(server.endpoint());

        let server_handle =
            tokio::spawn(async move { server.respond_once(200, r#"{"success":false}"#).await });

        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        server_handle.await.unwrap();
        assert!(err.to_string().contains(UNKNOWN_ERROR));
    }

    #[tokio::test]
    async fn non_2xx_is_transport_error_with_message() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(config(json!({"api_key": "bad"})))
            .unwrap()
            .with_endpoint(server.endpoint());

        let server_handle = tokio::spawn(async move {
            server
                .respond_once(401, r#"{"success":false,"message":"x"}"#)
                .await
        });

        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        server_handle.await.unwrap();

        assert!(matches!(err, ProviderError::Transport(_)));
        let message = err.to_string();
        assert!(message.contains("401"));
        assert!(message.contains(": x"));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_io() {
        let server = MockLoopsServer::start().await;
        let provider = LoopsProvider::new(ConfigMap::new())
            .unwrap()
            .with_endpoint(server.endpoint());

        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.to_string().contains("api_key"));

        let accepted =
            tokio::time::timeout(Duration::from_millis(100), server.listener.accept()).await;
        assert!(accepted.is_err(), "no connection should have been made");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let provider = LoopsProvider::new(config(json!({"api_key": "k"})))
            .unwrap()
            .with_endpoint(format!("http://127.0.0.1:{port}/api/v1/contacts/create"));
        let err = Provider::execute(&provider, &context(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
