//! Web search tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::search::{SearchHit, SearchProvider};
use super::{required_str, single_string_schema, Tool, ToolError};

/// Returned when the provider has nothing for the query.
pub const NO_RESULTS: &str = "No results found.";

const MAX_RESULTS: usize = 5;

/// Search the web through the configured provider.
pub struct WebSearch {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearch {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Use this when you need up-to-date facts, news, or data."
    }

    fn parameters_schema(&self) -> Value {
        single_string_schema("query", "The search query")
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let query = required_str(&args, self.name(), "query")?;

        tracing::info!(query = %query, "Running web search");

        let hits = self
            .provider
            .search(&query, MAX_RESULTS)
            .await
            .map_err(|e| {
                tracing::warn!(query = %query, error = %e, "Web search failed");
                ToolError::Search(e.to_string())
            })?;

        Ok(format_results(&hits))
    }
}

/// Render hits as `**title**`, snippet and source, separated by `---`.
pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }
    hits.iter()
        .take(MAX_RESULTS)
        .map(|h| format!("**{}**\n{}\nSource: {}\n", h.title, h.content, h.url))
        .collect::<Vec<_>>()
        .join("\n---\n")
}
