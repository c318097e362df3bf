use thiserror::Error;

/// Errors raised while rendering subscriber summaries.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template syntax error: {0}")]
    Syntax(String),

    #[error("template render error: {0}")]
    Render(String),

    #[error("rendered output exceeds {0} bytes")]
    TooLarge(usize),
}
