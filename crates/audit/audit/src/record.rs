use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use herald_core::{IntegrationId, LogId, SubscriberId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Success,
    Failed,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown log status: {other}")),
        }
    }
}

/// One attempt to deliver one subscriber through one integration.
///
/// Rows are append-only from the caller's point of view: the dispatch
/// pipeline creates a row as `pending` and finalizes it exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationLog {
    pub id: LogId,
    pub subscriber_id: SubscriberId,
    pub integration_id: IntegrationId,
    /// Provider kind at the time of the attempt.
    pub integration_type: String,
    pub status: LogStatus,
    /// Provider response on success.
    pub response_data: Option<serde_json::Value>,
    /// Failure description; empty unless `status` is `failed`.
    #[serde(default)]
    pub error_message: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl IntegrationLog {
    /// A fresh `pending` row.
    #[must_use]
    pub fn pending(
        subscriber_id: SubscriberId,
        integration_id: IntegrationId,
        integration_type: impl Into<String>,
    ) -> Self {
        Self {
            id: LogId::generate(),
            subscriber_id,
            integration_id,
            integration_type: integration_type.into(),
            status: LogStatus::Pending,
            response_data: None,
            error_message: String::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Apply a completion, stamping `completed_at`.
    pub fn apply(&mut self, completion: LogCompletion) {
        self.status = completion.status;
        self.response_data = completion.response_data;
        self.error_message = completion.error_message;
        self.completed_at = Some(Utc::now());
    }
}

/// Final outcome written to a pending row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogCompletion {
    pub status: LogStatus,
    pub response_data: Option<serde_json::Value>,
    pub error_message: String,
}

impl LogCompletion {
    pub fn success(response: serde_json::Value) -> Self {
        Self {
            status: LogStatus::Success,
            response_data: Some(response),
            error_message: String::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: LogStatus::Failed,
            response_data: None,
            error_message: error.into(),
        }
    }
}

/// Query parameters for searching integration logs.
///
/// `status = pending` with `created_before` set to a cutoff surfaces rows
/// whose dispatch never finished (e.g. the process died mid-call).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LogQuery {
    pub subscriber_id: Option<SubscriberId>,
    pub integration_id: Option<IntegrationId>,
    pub integration_type: Option<String>,
    pub status: Option<LogStatus>,
    /// Only rows created strictly before this time.
    pub created_before: Option<DateTime<Utc>>,
    /// Only rows created at or after this time.
    pub created_after: Option<DateTime<Utc>>,
    /// Maximum number of rows to return (default 50, max 1000).
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LogQuery {
    /// Return the effective limit, clamped to 1..=1000, defaulting to 50.
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 1000)
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Whether `log` satisfies every filter of this query.
    pub fn matches(&self, log: &IntegrationLog) -> bool {
        self.subscriber_id
            .as_ref()
            .is_none_or(|id| *id == log.subscriber_id)
            && self
                .integration_id
                .as_ref()
                .is_none_or(|id| *id == log.integration_id)
            && self
                .integration_type
                .as_deref()
                .is_none_or(|t| t == log.integration_type)
            && self.status.is_none_or(|s| s == log.status)
            && self.created_before.is_none_or(|t| log.created_at < t)
            && self.created_after.is_none_or(|t| log.created_at >= t)
    }
}

/// A newest-first page of integration logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
    pub logs: Vec<IntegrationLog>,
    /// Total number of rows matching the query (before pagination).
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}
