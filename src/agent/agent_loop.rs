//! Core agent loop implementation.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::llm::{
    AssistantMessage, ChatClient, LlmClient, LlmError, ModelGateway, ModelProfiles,
    OpenRouterClient, ToolCall, ToolSchema,
};
use crate::tools::{SearchProvider, TavilyClient, ToolError, ToolRegistry};

use super::conversation::{Conversation, LoopState};
use super::events::AgentEvent;
use super::prompt::build_system_prompt;
use super::selector;

/// Failures that end a run. Tool failures never show up here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Max iterations ({limit}) reached without a final answer")]
    LoopLimitExceeded { limit: usize },
}

/// The research agent: a model node and a tool node in a loop.
pub struct Agent {
    gateway: ModelGateway,
    tools: ToolRegistry,
    tool_schemas: Vec<ToolSchema>,
    max_iterations: usize,
}

impl Agent {
    /// Create an agent talking to OpenRouter and Tavily.
    pub fn new(config: &Config) -> Self {
        let llm: Arc<dyn LlmClient> = Arc::new(OpenRouterClient::from_config(config));
        let gateway = ModelGateway::new(llm, config.profiles.clone());
        let search: Arc<dyn SearchProvider> = Arc::new(TavilyClient::from_config(config));
        let tools = ToolRegistry::new(&gateway, search);

        Self::with_parts(gateway, tools, config.max_iterations)
    }

    pub fn with_parts(gateway: ModelGateway, tools: ToolRegistry, max_iterations: usize) -> Self {
        let tool_schemas = tools.get_tool_schemas();
        Self {
            gateway,
            tools,
            tool_schemas,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn profiles(&self) -> &ModelProfiles {
        self.gateway.profiles()
    }

    /// Run the loop to completion and return the final answer.
    pub async fn run(
        &self,
        message: &str,
        history: &[String],
        model: Option<&str>,
    ) -> Result<String, AgentError> {
        self.drive(message, history, model, None).await
    }

    /// Run the loop, reporting text fragments and tool activity on `events`.
    pub async fn run_streaming(
        &self,
        message: &str,
        history: &[String],
        model: Option<&str>,
        events: mpsc::UnboundedSender<AgentEvent>,
    ) -> Result<String, AgentError> {
        self.drive(message, history, model, Some(&events)).await
    }

    async fn drive(
        &self,
        message: &str,
        history: &[String],
        model: Option<&str>,
        events: Option<&mpsc::UnboundedSender<AgentEvent>>,
    ) -> Result<String, AgentError> {
        let selection = selector::select(model, message, self.profiles());
        let client = self.gateway.get_client(&selection.profile);
        let system_prompt = build_system_prompt(&self.tools, selection.category);

        tracing::info!(
            profile = %selection.profile,
            reason = selection.reason,
            history = history.len(),
            "Starting research run"
        );

        let mut conversation = Conversation::new(history, message);
        let mut model_calls = 0usize;

        loop {
            match conversation.state() {
                LoopState::Thinking => {
                    if model_calls >= self.max_iterations {
                        tracing::warn!(limit = self.max_iterations, "Agent loop limit reached");
                        return Err(AgentError::LoopLimitExceeded {
                            limit: self.max_iterations,
                        });
                    }
                    model_calls += 1;
                    tracing::debug!("Agent iteration {}", model_calls);

                    let response = self
                        .think(&client, &conversation, &system_prompt, events)
                        .await?;
                    conversation.push_assistant(response);
                }
                LoopState::ExecutingTools => {
                    let calls = conversation.pending_tool_calls().to_vec();
                    let outputs = self.execute_tools(&calls, events).await;
                    conversation.record_tool_results(outputs);
                }
                LoopState::Done => {
                    tracing::info!(
                        iterations = model_calls,
                        messages = conversation.len(),
                        "Research run complete"
                    );
                    return conversation
                        .into_answer()
                        .ok_or(AgentError::Llm(LlmError::EmptyResponse));
                }
            }
        }
    }

    /// Model node: one completion over the system prompt plus conversation.
    async fn think(
        &self,
        client: &ChatClient,
        conversation: &Conversation,
        system_prompt: &str,
        events: Option<&mpsc::UnboundedSender<AgentEvent>>,
    ) -> Result<AssistantMessage, LlmError> {
        let messages = conversation.with_system(system_prompt);
        let tools = Some(self.tool_schemas.as_slice());

        match events {
            Some(tx) => {
                let sink = |content: String| {
                    let _ = tx.send(AgentEvent::TextDelta { content });
                };
                client.complete_streaming(&messages, tools, &sink).await
            }
            None => client.complete(&messages, tools).await,
        }
    }

    /// Tool node: run every call of one assistant turn concurrently and return
    /// their outputs in call order.
    async fn execute_tools(
        &self,
        calls: &[ToolCall],
        events: Option<&mpsc::UnboundedSender<AgentEvent>>,
    ) -> Vec<String> {
        let runs = calls
            .iter()
            .map(|call| self.execute_tool_call(call, events));
        futures::future::join_all(runs).await
    }

    /// Execute a single tool call and render its outcome as tool-result text.
    async fn execute_tool_call(
        &self,
        tool_call: &ToolCall,
        events: Option<&mpsc::UnboundedSender<AgentEvent>>,
    ) -> String {
        let name = tool_call.function.name.as_str();
        tracing::info!(
            tool = %name,
            call_id = %tool_call.id,
            args = %truncate_for_log(&tool_call.function.arguments, 500),
            "Calling tool"
        );
        if let Some(tx) = events {
            let _ = tx.send(AgentEvent::ToolCall {
                id: tool_call.id.clone(),
                name: name.to_string(),
            });
        }

        let outcome = match parse_arguments(name, &tool_call.function.arguments) {
            Ok(args) => self.tools.execute(name, args).await,
            Err(e) => Err(e),
        };
        let is_error = outcome.is_err();
        let text = render_tool_outcome(outcome);

        if is_error {
            tracing::warn!(tool = %name, call_id = %tool_call.id, result = %truncate_for_log(&text, 500), "Tool failed");
        } else {
            tracing::debug!(tool = %name, call_id = %tool_call.id, result = %truncate_for_log(&text, 1000), "Tool result");
        }
        if let Some(tx) = events {
            let _ = tx.send(AgentEvent::ToolResult {
                id: tool_call.id.clone(),
                name: name.to_string(),
            });
        }

        text
    }
}

/// Parse the model's raw argument string. An empty string means no arguments.
fn parse_arguments(tool: &str, raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: format!("arguments are not valid JSON: {}", e),
    })
}

/// Tool-result text for the model: the output, or the error description.
pub fn render_tool_outcome(outcome: Result<String, ToolError>) -> String {
    match outcome {
        Ok(output) => output,
        Err(e) => e.to_string(),
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}
