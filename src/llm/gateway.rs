//! Model gateway: hands out chat clients bound to a model profile.

use std::sync::{Arc, Mutex};

use super::{
    AssistantMessage, ChatMessage, DeltaSink, LlmClient, LlmError, ModelProfile, ModelProfiles,
    ToolSchema,
};

/// Binds a provider to the profile catalogue.
#[derive(Clone)]
pub struct ModelGateway {
    llm: Arc<dyn LlmClient>,
    profiles: Arc<ModelProfiles>,
}

impl ModelGateway {
    pub fn new(llm: Arc<dyn LlmClient>, profiles: ModelProfiles) -> Self {
        Self {
            llm,
            profiles: Arc::new(profiles),
        }
    }

    /// Get a client for the named profile. Unknown names use `general`.
    pub fn get_client(&self, profile_name: &str) -> ChatClient {
        if !self.profiles.contains(profile_name) {
            tracing::debug!(
                requested = %profile_name,
                "Unknown model profile, using general"
            );
        }
        ChatClient {
            llm: Arc::clone(&self.llm),
            profile: self.profiles.get(profile_name).clone(),
        }
    }

    pub fn profiles(&self) -> &ModelProfiles {
        &self.profiles
    }
}

/// A chat-completion client bound to one profile.
#[derive(Clone)]
pub struct ChatClient {
    llm: Arc<dyn LlmClient>,
    profile: ModelProfile,
}

impl ChatClient {
    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<AssistantMessage, LlmError> {
        self.llm.chat_completion(&self.profile, messages, tools).await
    }

    /// Streamed completion. Profiles with streaming disabled deliver the final
    /// text as a single fragment.
    ///
    /// When tools are on offer, fragments are held until the provider reports
    /// the kind of turn: a text answer releases them in order, a tool-call
    /// turn drops them, so `on_delta` only ever sees final-answer text.
    pub async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        on_delta: DeltaSink<'_>,
    ) -> Result<AssistantMessage, LlmError> {
        if !self.profile.streaming {
            let response = self.complete(messages, tools).await?;
            if let AssistantMessage::Text(text) = &response {
                if !text.is_empty() {
                    on_delta(text.clone());
                }
            }
            return Ok(response);
        }

        let tools = tools.filter(|t| !t.is_empty());
        if tools.is_none() {
            return self
                .llm
                .chat_completion_stream(&self.profile, messages, None, on_delta)
                .await;
        }

        let held = Mutex::new(Vec::new());
        let hold = |fragment: String| {
            if let Ok(mut held) = held.lock() {
                held.push(fragment);
            }
        };
        let response = self
            .llm
            .chat_completion_stream(&self.profile, messages, tools, &hold)
            .await?;

        let held = held.into_inner().unwrap_or_default();
        match &response {
            AssistantMessage::Text(_) => held.into_iter().for_each(on_delta),
            AssistantMessage::ToolCalls(calls) if !held.is_empty() => {
                tracing::debug!(
                    calls = calls.len(),
                    fragments = held.len(),
                    "Dropping text streamed alongside tool calls"
                );
            }
            AssistantMessage::ToolCalls(_) => {}
        }
        Ok(response)
    }
}
