use std::sync::Arc;

use herald_core::subscriber::non_empty;
use herald_core::{Audience, AudienceType, ConfigMap, Source, Subscriber};
use herald_store::EntityStore;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::IntakeError;
use crate::worker::{DispatchQueue, SubscriberCreated};

/// Audience reference carried by a public submission.
#[derive(Debug, Clone, Deserialize)]
pub struct AudienceRef {
    pub name: String,
    pub audience_type: AudienceType,
}

/// Body of a public form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    pub audience: AudienceRef,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub custom_data: ConfigMap,
}

/// A stored submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub subscriber: Subscriber,
    pub audience: Audience,
    pub source: Option<Source>,
    /// Whether the dispatch event was accepted by the queue.
    pub queued: bool,
}

/// Turns public submissions into subscribers and hands them to dispatch.
pub struct SubscriberIntake {
    store: Arc<dyn EntityStore>,
    queue: DispatchQueue,
}

impl SubscriberIntake {
    pub fn new(store: Arc<dyn EntityStore>, queue: DispatchQueue) -> Self {
        Self { store, queue }
    }

    /// Store a submission and enqueue its dispatch.
    ///
    /// The audience is found or created by `(name, type)` and the source by
    /// the domain of the `Origin` header, falling back to `Referer`. A
    /// duplicate `(audience, email)` fails before any event is emitted. A
    /// rejected enqueue is logged and reported through
    /// [`Submission::queued`]; the subscriber is kept either way.
    #[instrument(name = "intake.submit", skip_all, fields(audience = %request.audience.name))]
    pub async fn submit(
        &self,
        request: SubmissionRequest,
        origin: Option<&str>,
        referer: Option<&str>,
    ) -> Result<Submission, IntakeError> {
        let email = request.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(IntakeError::Invalid(format!(
                "invalid email address: {:?}",
                request.email
            )));
        }
        let audience_name = request.audience.name.trim();
        if audience_name.is_empty() {
            return Err(IntakeError::Invalid("audience name is required".into()));
        }

        let audience = self
            .store
            .get_or_create_audience(audience_name, request.audience.audience_type)
            .await?;

        let source = match source_domain(origin, referer) {
            Some(domain) => Some(self.store.get_or_create_source(&domain).await?),
            None => None,
        };

        let mut subscriber = Subscriber::new(audience.id.clone(), email);
        subscriber.first_name = request.first_name;
        subscriber.last_name = request.last_name;
        subscriber.phone = request.phone;
        subscriber.message = request.message;
        subscriber.custom_data = request.custom_data;
        subscriber.source_id = source.as_ref().map(|s| s.id.clone());

        let subscriber = self.store.create_subscriber(subscriber).await?;
        info!(subscriber_id = %subscriber.id, "subscriber created");

        let queued = match self.queue.enqueue(SubscriberCreated {
            subscriber_id: subscriber.id.clone(),
        }) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "subscriber stored but dispatch was not queued");
                false
            }
        };

        Ok(Submission {
            subscriber,
            audience,
            source,
            queued,
        })
    }
}

/// Domain of the first non-blank header among `origin` and `referer`.
///
/// Absolute URLs yield their host (and explicit port). Anything else is
/// taken up to the first `/`.
pub fn source_domain(origin: Option<&str>, referer: Option<&str>) -> Option<String> {
    let raw = non_empty(origin).or_else(|| non_empty(referer))?.trim();

    if let Ok(url) = Url::parse(raw)
        && let Some(host) = url.host_str()
    {
        return Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        });
    }

    let domain = raw.split('/').next().unwrap_or_default().trim();
    (!domain.is_empty()).then(|| domain.to_owned())
}
