//! Tool system for the agent.
//!
//! Each tool implements the [`Tool`] trait and returns an explicit `Result`.
//! The control loop turns failures into tool-result text, so a failing tool
//! never aborts a request.

mod reasoning;
pub(crate) mod search;
mod web;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm::{FunctionSchema, ModelGateway, ToolSchema};

pub use reasoning::ThinkDeeply;
pub use search::{SearchError, SearchHit, SearchProvider, TavilyClient};
pub use web::{format_results, WebSearch, NO_RESULTS};

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Search error: {0}")]
    Search(String),

    #[error("Reasoning error: {0}")]
    Reasoning(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// A capability the model can request mid-conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Immutable set of tools, built once at startup.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, used for prompts and schemas.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Register the research tools: `web_search` and `think_deeply`.
    pub fn new(gateway: &ModelGateway, search: Arc<dyn SearchProvider>) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(WebSearch::new(search)),
            Arc::new(ThinkDeeply::new(gateway)),
        ];
        Self::from_tools(tools)
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
            order: Vec::new(),
        };
        for tool in tools {
            let name = tool.name().to_string();
            if registry.tools.insert(name.clone(), tool).is_none() {
                registry.order.push(name);
            }
        }
        registry
    }

    /// List all registered tools.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.ordered()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    /// Tool descriptors in the function-calling format.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.ordered()
            .map(|t| ToolSchema {
                schema_type: "function".to_string(),
                function: FunctionSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }
}

/// Read a required, non-empty string argument.
fn required_str(args: &Value, tool: &str, key: &str) -> Result<String, ToolError> {
    match args.get(key).and_then(Value::as_str) {
        Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
        Some(_) => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("'{}' must not be empty", key),
        }),
        None => Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("missing '{}' argument", key),
        }),
    }
}

/// Schema for a tool taking a single required string argument.
fn single_string_schema(key: &str, description: &str) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        key.to_string(),
        json!({
            "type": "string",
            "description": description
        }),
    );
    json!({
        "type": "object",
        "properties": properties,
        "required": [key]
    })
}
