//! LLM module - chat message types, the provider seam, and the model gateway.
//!
//! - [`LlmClient`] is the raw provider interface (OpenRouter in production).
//! - [`ModelGateway`] binds a provider to named [`ModelProfile`]s and hands
//!   out [`ChatClient`]s.

mod error;
mod gateway;
mod openrouter;
mod profiles;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::LlmError;
pub use gateway::{ChatClient, ModelGateway};
pub use openrouter::OpenRouterClient;
pub use profiles::{ModelProfile, ModelProfiles, CODE, GENERAL, REASONING};

/// Receives incremental text fragments, in order, while a completion streams.
pub type DeltaSink<'a> = &'a (dyn Fn(String) + Send + Sync);

/// Message role as understood by OpenAI-compatible providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            call_type: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

fn function_type() -> String {
    "function".to_string()
}

/// Function name plus the raw JSON argument string emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// An assistant turn: either final text or a non-empty batch of tool calls.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantMessage {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

/// One entry of a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(AssistantMessage),
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    pub fn role(&self) -> Role {
        match self {
            Self::System(_) => Role::System,
            Self::User(_) => Role::User,
            Self::Assistant(_) => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    /// Text content, if the message carries any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::System(content) | Self::User(content) => Some(content),
            Self::Assistant(AssistantMessage::Text(content)) => Some(content),
            Self::Assistant(AssistantMessage::ToolCalls(_)) => None,
            Self::Tool { content, .. } => Some(content),
        }
    }
}

/// Tool descriptor in the OpenAI function-calling format.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Chat-completion provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a completion and return the whole assistant turn.
    async fn chat_completion(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<AssistantMessage, LlmError>;

    /// Run a streamed completion. Text fragments are handed to `on_delta` as
    /// they arrive; the assembled assistant turn is returned at the end.
    async fn chat_completion_stream(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        on_delta: DeltaSink<'_>,
    ) -> Result<AssistantMessage, LlmError>;
}
