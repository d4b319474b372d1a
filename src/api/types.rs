//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request body for `/chat` and `/chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The new user message
    pub message: String,

    /// Earlier user messages, oldest first
    #[serde(default)]
    pub history: Vec<String>,

    /// Optional model profile (`general`, `reasoning`, `code`) or `auto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Response body for `/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Error body for every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Payload of one `data:` frame on `/chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
}

/// Payload of the error frame that ends a failed stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Agent name
    pub agent: String,
}

/// Public description of a model profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub profile: String,
    pub name: String,
    pub description: String,
}
