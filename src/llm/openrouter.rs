//! OpenRouter chat-completions client (OpenAI-compatible wire format).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use super::{
    AssistantMessage, ChatMessage, DeltaSink, LlmClient, LlmError, ModelProfile, Role, ToolCall,
    ToolSchema,
};
use crate::config::Config;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// OpenRouter API client.
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    site_url: String,
    app_title: String,
    /// Whole-call timeout for non-streamed requests, idle timeout per event
    /// for streamed ones.
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.openrouter_api_key.clone(),
            api_url: OPENROUTER_API_URL.to_string(),
            site_url: config.site_url.clone(),
            app_title: config.app_title.clone(),
            timeout: config.request_timeout,
        }
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn request(&self, body: &CompletionRequest<'_>) -> reqwest::RequestBuilder {
        self.http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.app_title)
            .json(body)
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<AssistantMessage, LlmError> {
        let body = CompletionRequest::new(profile, messages, tools, false);

        tracing::debug!(
            model = %profile.model_id,
            messages = messages.len(),
            "Sending chat completion"
        );

        let response = self
            .request(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(LlmError::Api(error.message));
        }

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(LlmError::EmptyResponse)?;

        match message.tool_calls {
            Some(calls) if !calls.is_empty() => Ok(AssistantMessage::ToolCalls(calls)),
            _ => message
                .content
                .map(AssistantMessage::Text)
                .ok_or(LlmError::EmptyResponse),
        }
    }

    async fn chat_completion_stream(
        &self,
        profile: &ModelProfile,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
        on_delta: DeltaSink<'_>,
    ) -> Result<AssistantMessage, LlmError> {
        let body = CompletionRequest::new(profile, messages, tools, true);

        tracing::debug!(
            model = %profile.model_id,
            messages = messages.len(),
            "Starting streamed chat completion"
        );

        let mut source =
            EventSource::new(self.request(&body)).map_err(|e| LlmError::Stream(e.to_string()))?;
        let mut acc = StreamAccumulator::default();

        loop {
            let next = match tokio::time::timeout(self.timeout, source.next()).await {
                Ok(next) => next,
                Err(_) => {
                    source.close();
                    return Err(LlmError::Timeout(self.timeout.as_secs()));
                }
            };

            match next {
                None => break,
                Some(Ok(Event::Open)) => continue,
                Some(Ok(Event::Message(message))) => {
                    let data = message.data.trim();
                    if data == "[DONE]" {
                        source.close();
                        break;
                    }
                    let chunk: StreamChunk = match serde_json::from_str(data) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            source.close();
                            return Err(LlmError::Decode(format!("{}, data: {}", e, data)));
                        }
                    };
                    if let Some(error) = chunk.error {
                        source.close();
                        return Err(LlmError::Api(error.message));
                    }
                    for choice in chunk.choices {
                        if let Some(fragment) = acc.push(choice.delta) {
                            on_delta(fragment);
                        }
                    }
                }
                Some(Err(reqwest_eventsource::Error::StreamEnded)) => break,
                Some(Err(reqwest_eventsource::Error::InvalidStatusCode(status, response))) => {
                    source.close();
                    let body = response.text().await.unwrap_or_default();
                    return Err(LlmError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Some(Err(e)) => {
                    source.close();
                    return Err(LlmError::Stream(e.to_string()));
                }
            }
        }

        acc.finish()
    }
}

impl OpenRouterClient {
    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout.as_secs())
        } else {
            LlmError::Http(e)
        }
    }
}

// ── Wire types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    stream: bool,
}

impl<'a> CompletionRequest<'a> {
    fn new(
        profile: &'a ModelProfile,
        messages: &'a [ChatMessage],
        tools: Option<&'a [ToolSchema]>,
        stream: bool,
    ) -> Self {
        Self {
            model: &profile.model_id,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: profile.temperature,
            tools: tools.filter(|t| !t.is_empty()),
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<&'a [ToolCall]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        let mut wire = WireMessage {
            role: message.role(),
            content: message.text(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        };
        match message {
            ChatMessage::Assistant(AssistantMessage::ToolCalls(calls)) => {
                wire.tool_calls = Some(calls.as_slice());
            }
            ChatMessage::Tool {
                tool_call_id, name, ..
            } => {
                wire.tool_call_id = Some(tool_call_id.as_str());
                wire.name = Some(name.as_str());
            }
            _ => {}
        }
        wire
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: usize,
    id: Option<String>,
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    name: Option<String>,
    arguments: Option<String>,
}

/// Reassembles a streamed assistant turn from its deltas.
#[derive(Debug, Default)]
struct StreamAccumulator {
    content: Option<String>,
    calls: BTreeMap<usize, ToolCall>,
}

impl StreamAccumulator {
    /// Fold one delta in; returns the text fragment to forward, if any.
    /// Once a tool-call delta has been seen, text is kept but not forwarded.
    fn push(&mut self, delta: StreamDelta) -> Option<String> {
        for call in delta.tool_calls.unwrap_or_default() {
            let entry = self
                .calls
                .entry(call.index)
                .or_insert_with(|| ToolCall::new("", "", ""));
            if let Some(id) = call.id {
                entry.id = id;
            }
            if let Some(function) = call.function {
                if let Some(name) = function.name {
                    entry.function.name.push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    entry.function.arguments.push_str(&arguments);
                }
            }
        }

        match delta.content {
            Some(fragment) if !fragment.is_empty() => {
                self.content
                    .get_or_insert_with(String::new)
                    .push_str(&fragment);
                self.calls.is_empty().then_some(fragment)
            }
            Some(_) => {
                self.content.get_or_insert_with(String::new);
                None
            }
            None => None,
        }
    }

    fn finish(self) -> Result<AssistantMessage, LlmError> {
        if !self.calls.is_empty() {
            let calls = self
                .calls
                .into_iter()
                .enumerate()
                .map(|(position, (_, mut call))| {
                    if call.id.is_empty() {
                        call.id = format!("call_{}", position);
                    }
                    call
                })
                .collect();
            return Ok(AssistantMessage::ToolCalls(calls));
        }
        self.content
            .map(AssistantMessage::Text)
            .ok_or(LlmError::EmptyResponse)
    }
}
