//! Chat endpoints: request/response and server-sent events.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use uuid::Uuid;

use super::routes::AppState;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, StreamChunk, StreamError};
use crate::agent::AgentEvent;

/// Terminates every stream, successful or not.
const DONE_SENTINEL: &str = "[DONE]";

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}

/// Unwrap the JSON body and reject requests the agent cannot run.
fn validate(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, Response> {
    let Json(request) = payload.map_err(|rejection| {
        error_response(rejection.status(), rejection.body_text())
    })?;
    if request.message.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "message must not be empty".to_string(),
        ));
    }
    Ok(request)
}

/// `POST /chat` - run the agent to completion.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match validate(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state
        .agent
        .run(&request.message, &request.history, request.model.as_deref())
        .await
    {
        Ok(response) => Json(ChatResponse { response }).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "Chat request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// `POST /chat/stream` - run the agent and stream assistant text as SSE.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match validate(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    Sse::new(agent_stream(state, request))
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keepalive"),
        )
        .into_response()
}

/// Aborts the agent task when the SSE stream is dropped, so a client that
/// disconnects does not keep remote calls running.
struct AbortOnDrop {
    stream_id: Uuid,
    handle: AbortHandle,
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            tracing::info!(stream_id = %self.stream_id, "Chat stream dropped; abandoning agent run");
            self.handle.abort();
        }
    }
}

fn agent_stream(
    state: Arc<AppState>,
    request: ChatRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let stream_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<AgentEvent>();

    let agent = Arc::clone(&state.agent);
    let task = tokio::spawn(async move {
        agent
            .run_streaming(
                &request.message,
                &request.history,
                request.model.as_deref(),
                tx,
            )
            .await
    });
    let guard = AbortOnDrop {
        stream_id,
        handle: task.abort_handle(),
    };

    tracing::info!(stream_id = %stream_id, "Chat stream opened");

    async_stream::stream! {
        let _guard = guard;

        // The channel closes once the run finishes and drops its sender.
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::TextDelta { content } => {
                    match Event::default().json_data(StreamChunk { content }) {
                        Ok(sse) => yield Ok(sse),
                        Err(e) => {
                            tracing::error!(stream_id = %stream_id, error = %e, "Failed to serialize SSE chunk; dropping");
                        }
                    }
                }
                AgentEvent::ToolCall { id, name } => {
                    tracing::debug!(stream_id = %stream_id, call_id = %id, tool = %name, "Tool started");
                }
                AgentEvent::ToolResult { id, name } => {
                    tracing::debug!(stream_id = %stream_id, call_id = %id, tool = %name, "Tool finished");
                }
            }
        }

        let failure = match task.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                tracing::error!(stream_id = %stream_id, error = ?e, "Chat stream failed");
                Some(e.to_string())
            }
            Err(e) => {
                tracing::error!(stream_id = %stream_id, error = %e, "Chat stream task failed");
                Some("agent task failed".to_string())
            }
        };

        if let Some(error) = failure {
            match Event::default().json_data(StreamError { error }) {
                Ok(sse) => yield Ok(sse),
                Err(e) => {
                    tracing::error!(stream_id = %stream_id, error = %e, "Failed to serialize SSE error frame");
                }
            }
        }

        yield Ok(Event::default().data(DONE_SENTINEL));
        tracing::info!(stream_id = %stream_id, "Chat stream closed");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::agent::Agent;
    use crate::api::routes::router;
    use crate::api::types::{HealthResponse, ModelInfo};
    use crate::llm::scripted::ScriptedLlm;
    use crate::llm::{LlmError, ModelGateway, ModelProfiles, ToolCall};
    use crate::tools::search::tests::{hit, FakeSearch};
    use crate::tools::ToolRegistry;

    /// Serve the API on an ephemeral port and return its base URL.
    async fn spawn_server(llm: Arc<ScriptedLlm>) -> String {
        let gateway = ModelGateway::new(llm, ModelProfiles::default());
        let tools = ToolRegistry::new(&gateway, Arc::new(FakeSearch::with_hits(vec![hit(1)])));
        let agent = Arc::new(Agent::with_parts(gateway, tools, 5));
        let app = router(Arc::new(AppState { agent }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Payloads of the `data:` lines of an SSE body, keep-alives skipped.
    fn data_frames(body: &str) -> Vec<String> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.trim_start().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_health_needs_no_collaborators() {
        let base = spawn_server(Arc::new(ScriptedLlm::new())).await;
        let response = reqwest::get(format!("{}/health", base)).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: HealthResponse = response.json().await.unwrap();
        assert_eq!(body.status, "ok");
        assert_eq!(body.agent, "Deep Research");
    }

    #[tokio::test]
    async fn test_chat_returns_final_answer() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_tool_calls(
            "general",
            vec![ToolCall::new("s1", "web_search", r#"{"query": "weather"}"#)],
        );
        llm.push_text("general", "Sunny, per example.com.");
        let base = spawn_server(llm).await;

        let response = reqwest::Client::new()
            .post(format!("{}/chat", base))
            .json(&json!({"message": "Weather?", "history": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: ChatResponse = response.json().await.unwrap();
        assert_eq!(body.response, "Sunny, per example.com.");
    }

    #[tokio::test]
    async fn test_chat_failure_is_500_with_detail() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_error("general", "provider unreachable");
        let base = spawn_server(llm).await;

        let response = reqwest::Client::new()
            .post(format!("{}/chat", base))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let body: ErrorResponse = response.json().await.unwrap();
        assert!(body.detail.contains("provider unreachable"));
    }

    #[tokio::test]
    async fn test_chat_failure_detail_omits_provider_body() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_failure(
            "general",
            LlmError::Status {
                status: 502,
                body: r#"{"error": "upstream trace id 7f3a"}"#.to_string(),
            },
        );
        let base = spawn_server(llm).await;

        let response = reqwest::Client::new()
            .post(format!("{}/chat", base))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500);
        let body: ErrorResponse = response.json().await.unwrap();
        assert_eq!(body.detail, "LLM provider returned HTTP 502");
    }

    #[tokio::test]
    async fn test_malformed_requests_are_client_errors() {
        let llm = Arc::new(ScriptedLlm::new());
        let base = spawn_server(llm.clone()).await;
        let client = reqwest::Client::new();

        let missing = client
            .post(format!("{}/chat", base))
            .json(&json!({"history": ["hi"]}))
            .send()
            .await
            .unwrap();
        assert!(missing.status().is_client_error());
        let body: ErrorResponse = missing.json().await.unwrap();
        assert!(!body.detail.is_empty());

        let blank = client
            .post(format!("{}/chat/stream", base))
            .json(&json!({"message": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(blank.status(), 400);

        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stream_frames_match_chat_response() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_tool_calls(
            "general",
            vec![ToolCall::new("s1", "web_search", r#"{"query": "greeting"}"#)],
        );
        llm.push_fragments("general", &["Hel", "lo"]);
        llm.push_fragments("general", &["Hel", "lo"]);
        let base = spawn_server(llm).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/chat/stream", base))
            .json(&json!({"message": "greet me", "history": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert!(response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .starts_with("text/event-stream"));

        let frames = data_frames(&response.text().await.unwrap());
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], "[DONE]");

        let streamed: String = frames[..2]
            .iter()
            .map(|f| {
                let chunk: StreamChunk = serde_json::from_str(f).unwrap();
                chunk.content
            })
            .collect();
        assert_eq!(
            serde_json::from_str::<Value>(&frames[0]).unwrap(),
            json!({"content": "Hel"})
        );

        let plain: ChatResponse = client
            .post(format!("{}/chat", base))
            .json(&json!({"message": "greet me"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(streamed, plain.response);
    }

    #[tokio::test]
    async fn test_stream_omits_text_from_tool_turns() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_preamble_then_tool_calls(
            "general",
            &["Let me look that up. "],
            vec![ToolCall::new("s1", "web_search", r#"{"query": "greeting"}"#)],
        );
        llm.push_fragments("general", &["Hel", "lo"]);
        let base = spawn_server(llm).await;

        let body = reqwest::Client::new()
            .post(format!("{}/chat/stream", base))
            .json(&json!({"message": "greet me"}))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let frames = data_frames(&body);
        assert_eq!(frames.len(), 3);
        let contents: Vec<String> = frames[..2]
            .iter()
            .map(|f| serde_json::from_str::<StreamChunk>(f).unwrap().content)
            .collect();
        assert_eq!(contents, vec!["Hel", "lo"]);
        assert_eq!(frames[2], "[DONE]");
    }

    #[tokio::test]
    async fn test_stream_failure_ends_with_error_then_done() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_error("general", "model overloaded");
        let base = spawn_server(llm).await;

        let body = reqwest::Client::new()
            .post(format!("{}/chat/stream", base))
            .json(&json!({"message": "hi"}))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let frames = data_frames(&body);
        assert_eq!(frames.len(), 2);
        let error: StreamError = serde_json::from_str(&frames[0]).unwrap();
        assert!(error.error.contains("model overloaded"));
        assert_eq!(frames[1], "[DONE]");
    }

    #[tokio::test]
    async fn test_models_lists_profiles_without_model_ids() {
        let base = spawn_server(Arc::new(ScriptedLlm::new())).await;
        let models: Vec<ModelInfo> = reqwest::get(format!("{}/models", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let names: Vec<_> = models.iter().map(|m| m.profile.as_str()).collect();
        assert_eq!(names, vec!["general", "reasoning", "code"]);
        assert!(models.iter().all(|m| !m.name.contains('/')));
    }
}
