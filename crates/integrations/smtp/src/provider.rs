use std::time::Duration;

use herald_core::{ConfigMap, SubscriberContext};
use herald_provider::config::require_keys;
use herald_provider::{Provider, ProviderError};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument};

use crate::config::{self, KIND, REQUIRED_KEYS, SmtpSettings};
use crate::message::build_message;

/// Per-command timeout of the SMTP session.
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP provider e-mailing a notification for each new subscriber.
///
/// A transport is built per delivery from the stored config, so a config
/// fix takes effect on the next dispatch without restarting anything.
pub struct SmtpProvider {
    config: ConfigMap,
}

impl SmtpProvider {
    pub fn new(config: ConfigMap) -> Self {
        Self { config }
    }
}

/// Build an async SMTP transport.
///
/// With `use_tls` the session is upgraded via STARTTLS; without it the
/// session stays plaintext and STARTTLS is never attempted. Credentials are
/// only attached when both username and password are set.
fn build_transport(
    settings: &SmtpSettings,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, ProviderError> {
    let builder = if settings.use_tls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| ProviderError::Configuration(format!("SMTP TLS relay error: {e}")))?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
    };

    let builder = builder.port(settings.port).timeout(Some(SMTP_TIMEOUT));

    let builder = if let Some((user, pass)) = settings.credentials() {
        builder.credentials(Credentials::new(user.to_owned(), pass.to_owned()))
    } else {
        builder
    };

    Ok(builder.build())
}

/// Every lettre failure is a transport failure carrying the underlying text.
fn map_smtp_error(error: &lettre::transport::smtp::Error) -> ProviderError {
    ProviderError::Transport(format!("SMTP error: {error}"))
}

impl Provider for SmtpProvider {
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

        let resolved = SmtpSettings::resolve(&self.config, settings)?;
        debug!(
            host = %resolved.host,
            port = resolved.port,
            use_tls = resolved.use_tls,
            "building SMTP message"
        );
        let message = build_message(&resolved, ctx)?;
        let transport = build_transport(&resolved)?;

        transport.send(message).await.map_err(|e| {
            error!(error = %e, "SMTP send failed");
            map_smtp_error(&e)
        })?;

        info!(to = %resolved.to_email, "subscriber notification e-mailed");
        Ok(json!({"success": true, "to_email": resolved.to_email}))
    }
}
