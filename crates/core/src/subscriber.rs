use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audience::{Audience, Source};
use crate::types::{AudienceId, ConfigMap, SourceId, SubscriberId};

/// A person who submitted a form into an audience.
///
/// `(audience_id, email)` is unique; creating a subscriber is the only event
/// that triggers integration dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub audience_id: AudienceId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub custom_data: ConfigMap,
    pub source_id: Option<SourceId>,
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Create a subscriber with only the required fields set.
    #[must_use]
    pub fn new(audience_id: AudienceId, email: impl Into<String>) -> Self {
        Self {
            id: SubscriberId::generate(),
            audience_id,
            email: email.into(),
            first_name: None,
            last_name: None,
            phone: None,
            message: None,
            custom_data: ConfigMap::new(),
            source_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source_id: SourceId) -> Self {
        self.source_id = Some(source_id);
        self
    }
}

/// The resolved subscriber graph handed to providers.
#[derive(Debug, Clone)]
pub struct SubscriberContext {
    pub subscriber: Subscriber,
    pub audience: Audience,
    pub source: Option<Source>,
}

impl SubscriberContext {
    pub fn new(subscriber: Subscriber, audience: Audience, source: Option<Source>) -> Self {
        Self {
            subscriber,
            audience,
            source,
        }
    }

    pub fn email(&self) -> &str {
        &self.subscriber.email
    }

    /// The audience name, or `None` when it is blank.
    pub fn audience_name(&self) -> Option<&str> {
        non_empty(Some(self.audience.name.as_str()))
    }

    /// The source domain, or `None` for submissions without an origin.
    pub fn source_domain(&self) -> Option<&str> {
        non_empty(self.source.as_ref().map(|s| s.domain.as_str()))
    }
}

/// Treat empty and whitespace-only strings as absent.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
