use herald_provider::ProviderError;
use thiserror::Error;

/// Errors specific to the push-notification provider.
#[derive(Debug, Error)]
pub enum NtfyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ntfy returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl From<NtfyError> for ProviderError {
    fn from(err: NtfyError) -> Self {
        ProviderError::Transport(err.to_string())
    }
}
