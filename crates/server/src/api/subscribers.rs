use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, StatusCode, header};
use chrono::{DateTime, Utc};
use herald_core::{AudienceType, ConfigMap, SubscriberId};
use herald_dispatch::{Submission, SubmissionRequest};
use serde::Serialize;

use super::AppState;
use crate::error::ServerError;

#[derive(Debug, Serialize)]
pub struct AudienceView {
    pub name: String,
    pub audience_type: AudienceType,
}

/// Response body of a created subscriber.
#[derive(Debug, Serialize)]
pub struct SubscriberResponse {
    pub id: SubscriberId,
    pub audience: AudienceView,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub custom_data: ConfigMap,
    /// Domain the submission came from, if any.
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubscriberResponse {
    fn from(submission: Submission) -> Self {
        let Submission {
            subscriber,
            audience,
            source,
            ..
        } = submission;
        Self {
            id: subscriber.id,
            audience: AudienceView {
                name: audience.name,
                audience_type: audience.audience_type,
            },
            email: subscriber.email,
            first_name: subscriber.first_name,
            last_name: subscriber.last_name,
            phone: subscriber.phone,
            message: subscriber.message,
            custom_data: subscriber.custom_data,
            source: source.map(|s| s.domain),
            created_at: subscriber.created_at,
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /v1/subscribers` -- public form submission.
///
/// The source is recorded from the `Origin` header, falling back to
/// `Referer`. Integrations are dispatched in the background.
pub async fn create_subscriber(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriberResponse>), ServerError> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

    let submission = state
        .intake
        .submit(
            request,
            header_str(&headers, header::ORIGIN),
            header_str(&headers, header::REFERER),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(submission.into())))
}
