use herald_provider::ProviderError;
use thiserror::Error;

/// Errors specific to the contact-sync provider.
///
/// These are internal errors that get converted into [`ProviderError`] at the
/// public API boundary.
#[derive(Debug, Error)]
pub enum LoopsError {
    /// An HTTP-level transport error occurred.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// The API answered 2xx but did not report success.
    #[error("Loops API error: {0}")]
    Api(String),

    /// The response body was not valid JSON.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<LoopsError> for ProviderError {
    fn from(err: LoopsError) -> Self {
        match err {
            LoopsError::Http(e) => ProviderError::Transport(e.to_string()),
            e @ LoopsError::UnexpectedStatus { .. } => ProviderError::Transport(e.to_string()),
            e @ LoopsError::Api(_) => ProviderError::Rejected(e.to_string()),
            LoopsError::InvalidResponse(msg) => ProviderError::Serialization(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_status_maps_to_transport() {
        let err: ProviderError = LoopsError::UnexpectedStatus {
            status: 401,
            message: "Invalid API key".into(),
        }
        .into();
        assert!(matches!(err, ProviderError::Transport(_)));
        assert!(err.to_string().contains("HTTP 401: Invalid API key"));
    }

    #[test]
    fn api_error_maps_to_rejected() {
        let err: ProviderError = LoopsError::Api("Email already exists".into()).into();
        assert!(matches!(err, ProviderError::Rejected(_)));
        assert!(err.to_string().contains("Loops API error: Email already exists"));
    }

    #[test]
    fn invalid_response_maps_to_serialization() {
        let err: ProviderError = LoopsError::InvalidResponse("eof".into()).into();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }
}
