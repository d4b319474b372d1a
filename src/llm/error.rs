use thiserror::Error;

/// Failures talking to the model provider. None of these are recoverable
/// inside the control loop.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// `body` is kept for logs only; it never reaches API clients.
    #[error("LLM provider returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("Failed to decode LLM response: {0}")]
    Decode(String),

    #[error("LLM stream error: {0}")]
    Stream(String),

    #[error("LLM call timed out after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,

    #[error("LLM provider error: {0}")]
    Api(String),
}
