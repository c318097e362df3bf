use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AudienceId, SourceId};

/// The kind of list an audience represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceType {
    Waitlist,
    Newsletter,
    ContactForm,
}

impl AudienceType {
    /// Returns the wire name of the audience type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waitlist => "waitlist",
            Self::Newsletter => "newsletter",
            Self::ContactForm => "contact_form",
        }
    }
}

impl fmt::Display for AudienceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudienceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waitlist" => Ok(Self::Waitlist),
            "newsletter" => Ok(Self::Newsletter),
            "contact_form" => Ok(Self::ContactForm),
            other => Err(format!("unknown audience type: {other}")),
        }
    }
}

/// A named list that subscribers join.
///
/// An audience owns its subscribers and its integration links; deleting it
/// removes both. Deactivating it does not touch historical subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audience {
    pub id: AudienceId,
    pub name: String,
    pub audience_type: AudienceType,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Audience {
    /// Create a new active audience with a generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, audience_type: AudienceType) -> Self {
        Self {
            id: AudienceId::generate(),
            name: name.into(),
            audience_type,
            description: String::new(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The origin domain a submission came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub domain: String,
    #[serde(default)]
    pub description: String,
}

impl Source {
    #[must_use]
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            id: SourceId::generate(),
            domain: domain.into(),
            description: String::new(),
        }
    }
}
