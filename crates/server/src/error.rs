use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herald_audit::LogStoreError;
use herald_dispatch::{DispatchError, IntakeError};
use herald_store::StoreError;
use thiserror::Error;

/// Errors that can occur when running the Herald server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration or startup seeding error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. reading the config file or binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("log store error: {0}")]
    LogStore(#[from] LogStoreError),
}

impl From<DispatchError> for ServerError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Store(e) => Self::Store(e),
            DispatchError::LogStore(e) => Self::LogStore(e),
            DispatchError::Configuration(msg) => Self::Config(msg),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) | Self::Intake(IntakeError::Invalid(_)) => StatusCode::BAD_REQUEST,
            Self::Intake(IntakeError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::Io(_)
            | Self::Intake(IntakeError::Store(_))
            | Self::Store(_)
            | Self::LogStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_errors_map_to_client_statuses() {
        let resp = ServerError::from(IntakeError::Duplicate("a@b.com".into())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = ServerError::from(IntakeError::Invalid("email".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ServerError::from(IntakeError::Store(StoreError::Backend("down".into())))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn missing_entities_are_404() {
        let err =
            ServerError::from(DispatchError::Store(StoreError::NotFound("audience x".into())));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn bad_request_is_400() {
        let resp = ServerError::BadRequest("nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
