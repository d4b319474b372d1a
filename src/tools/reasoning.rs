//! Deep reasoning tool backed by the reasoning model profile.

use async_trait::async_trait;
use serde_json::Value;

use super::{required_str, single_string_schema, Tool, ToolError};
use crate::llm::{AssistantMessage, ChatClient, ChatMessage, ModelGateway, REASONING};

const REASONING_INSTRUCTION: &str = "Think through this step by step. Consider multiple angles.";

/// Hand a hard question to the reasoning model.
pub struct ThinkDeeply {
    client: ChatClient,
}

impl ThinkDeeply {
    pub fn new(gateway: &ModelGateway) -> Self {
        Self {
            client: gateway.get_client(REASONING),
        }
    }
}

#[async_trait]
impl Tool for ThinkDeeply {
    fn name(&self) -> &str {
        "think_deeply"
    }

    fn description(&self) -> &str {
        "Take time to think through a complex problem step by step. Use this for analysis, comparisons, or when the user asks 'why'."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("question", "The question or problem to reason about")
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let question = required_str(&args, self.name(), "question")?;

        tracing::info!(model = %self.client.profile().model_id, "Reasoning deeply");

        let messages = [
            ChatMessage::system(REASONING_INSTRUCTION),
            ChatMessage::user(question),
        ];

        match self.client.complete(&messages, None).await {
            Ok(AssistantMessage::Text(text)) => Ok(text),
            Ok(AssistantMessage::ToolCalls(_)) => Err(ToolError::Reasoning(
                "reasoning model requested tools".to_string(),
            )),
            Err(e) => Err(ToolError::Reasoning(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm::scripted::ScriptedLlm;
    use crate::llm::{ModelProfiles, ToolCall};

    fn tool(llm: Arc<ScriptedLlm>) -> ThinkDeeply {
        ThinkDeeply::new(&ModelGateway::new(llm, ModelProfiles::default()))
    }

    #[tokio::test]
    async fn test_uses_reasoning_profile_with_fixed_instruction() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_text("reasoning", "Because of X and Y.");

        let output = tool(llm.clone())
            .execute(json!({"question": "Why is the sky blue?"}))
            .await
            .unwrap();
        assert_eq!(output, "Because of X and Y.");

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].profile, "reasoning");
        assert!(calls[0].tool_names.is_empty());
        assert_eq!(
            calls[0].messages,
            vec![
                ChatMessage::system(REASONING_INSTRUCTION),
                ChatMessage::user("Why is the sky blue?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_model_failure_becomes_reasoning_error() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_error("reasoning", "upstream 503");

        let err = tool(llm)
            .execute(json!({"question": "Why?"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Reasoning(_)));
        assert!(err.to_string().contains("upstream 503"));
    }

    #[tokio::test]
    async fn test_tool_calls_from_reasoning_model_are_rejected() {
        let llm = Arc::new(ScriptedLlm::new());
        llm.push_tool_calls("reasoning", vec![ToolCall::new("c1", "web_search", "{}")]);

        let err = tool(llm)
            .execute(json!({"question": "Why?"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Reasoning(_)));
    }

    #[tokio::test]
    async fn test_missing_question_is_rejected() {
        let llm = Arc::new(ScriptedLlm::new());
        let err = tool(llm.clone()).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(llm.calls().is_empty());
    }
}
