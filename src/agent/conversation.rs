//! Per-request conversation state.

use crate::llm::{AssistantMessage, ChatMessage, ToolCall};

/// Where the control loop stands, derived from the last message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The model has to be called next.
    Thinking,
    /// The last assistant turn requested tools.
    ExecutingTools,
    /// The last assistant turn is a final answer.
    Done,
}

/// Append-only message sequence owned by one control loop run.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Start a conversation from prior user turns and the new message.
    pub fn new(history: &[String], message: &str) -> Self {
        let mut messages: Vec<ChatMessage> =
            history.iter().map(|h| ChatMessage::user(h.as_str())).collect();
        messages.push(ChatMessage::user(message));
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> LoopState {
        match self.messages.last() {
            Some(ChatMessage::Assistant(AssistantMessage::ToolCalls(_))) => {
                LoopState::ExecutingTools
            }
            Some(ChatMessage::Assistant(AssistantMessage::Text(_))) => LoopState::Done,
            Some(ChatMessage::System(_))
            | Some(ChatMessage::User(_))
            | Some(ChatMessage::Tool { .. })
            | None => LoopState::Thinking,
        }
    }

    /// The full prompt for the next model call.
    pub fn with_system(&self, system_prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(self.messages.iter().cloned());
        messages
    }

    pub fn push_assistant(&mut self, message: AssistantMessage) {
        self.messages.push(ChatMessage::Assistant(message));
    }

    /// Tool calls of the last assistant turn, if it requested any.
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        match self.messages.last() {
            Some(ChatMessage::Assistant(AssistantMessage::ToolCalls(calls))) => calls,
            _ => &[],
        }
    }

    /// Append one tool-result message per pending call, in call order.
    ///
    /// `outputs[i]` answers the i-th pending call. Results are only ever
    /// built from outstanding calls, so ids cannot drift.
    pub fn record_tool_results(&mut self, outputs: Vec<String>) {
        let calls = self.pending_tool_calls().to_vec();
        debug_assert_eq!(calls.len(), outputs.len());
        for (call, content) in calls.into_iter().zip(outputs) {
            self.messages.push(ChatMessage::Tool {
                tool_call_id: call.id,
                name: call.function.name,
                content,
            });
        }
    }

    /// Consume the conversation and return the final answer text.
    pub fn into_answer(mut self) -> Option<String> {
        match self.messages.pop() {
            Some(ChatMessage::Assistant(AssistantMessage::Text(text))) => Some(text),
            _ => None,
        }
    }
}
