//! In-process LLM fake that replays scripted turns per profile.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    AssistantMessage, ChatMessage, DeltaSink, LlmClient, LlmError, ModelProfile, ToolCall,
    ToolSchema,
};

enum ScriptedTurn {
    Reply {
        response: AssistantMessage,
        fragments: Vec<String>,
    },
    Fail(LlmError),
}

/// A completion request as seen by the fake.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub profile: String,
    pub messages: Vec<ChatMessage>,
    pub tool_names: Vec<String>,
    pub streamed: bool,
}

#[derive(Default)]
pub(crate) struct ScriptedLlm {
    turns: Mutex<HashMap<String, VecDeque<ScriptedTurn>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, profile: &str, text: &str) {
        self.push_fragments(profile, &[text]);
    }

    /// Queue a text reply that streams as the given fragments.
    pub fn push_fragments(&self, profile: &str, fragments: &[&str]) {
        self.push(
            profile,
            ScriptedTurn::Reply {
                response: AssistantMessage::Text(fragments.concat()),
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
            },
        );
    }

    pub fn push_tool_calls(&self, profile: &str, calls: Vec<ToolCall>) {
        self.push_preamble_then_tool_calls(profile, &[], calls);
    }

    /// Queue a tool-call turn that streams some text before the calls, the
    /// way models often announce what they are about to look up.
    pub fn push_preamble_then_tool_calls(
        &self,
        profile: &str,
        preamble: &[&str],
        calls: Vec<ToolCall>,
    ) {
        self.push(
            profile,
            ScriptedTurn::Reply {
                response: AssistantMessage::ToolCalls(calls),
                fragments: preamble.iter().map(|f| f.to_string()).collect(),
            },
        );
    }

    pub fn push_error(&self, profile: &str, message: &str) {
        self.push_failure(profile, LlmError::Api(message.to_string()));
    }

    pub fn push_failure(&self, profile: &str, error: LlmError) {
        self.push(profile, ScriptedTurn::Fail(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, profile: &str, turn: ScriptedTurn) {
        self.turns
            .lock()
            .unwrap()
            .entry(profile.to_string())
            .or_default()
            .push_back(turn);
    }

    fn next(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        streamed: bool,
    ) -> Result<(AssistantMessage, Vec<String>), LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            profile: profile.name.clone(),
            messages: messages.to_vec(),
            tool_names: tools
                .unwrap_or_default()
                .iter()
                .map(|t| t.function.name.clone())
                .collect(),
            streamed,
        });

        let turn = self
            .turns
            .lock()
            .unwrap()
            .get_mut(&profile.name)
            .and_then(|queue| queue.pop_front());

        match turn {
            Some(ScriptedTurn::Reply {
                response,
                fragments,
            }) => Ok((response, fragments)),
            Some(ScriptedTurn::Fail(error)) => Err(error),
            None => Err(LlmError::Api(format!(
                "no scripted response for profile {}",
                profile.name
            ))),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<AssistantMessage, LlmError> {
        self.next(profile, messages, tools, false)
            .map(|(response, _)| response)
    }

    async fn chat_completion_stream(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        on_delta: DeltaSink<'_>,
    ) -> Result<AssistantMessage, LlmError> {
        let (response, fragments) = self.next(profile, messages, tools, true)?;
        for fragment in fragments {
            on_delta(fragment);
        }
        Ok(response)
    }
}
