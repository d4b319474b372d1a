//! System prompt templates for the agent.

use crate::tools::ToolRegistry;

use super::selector::Category;

/// Build the system prompt with tool descriptions and category guidance.
pub fn build_system_prompt(tools: &ToolRegistry, category: Category) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        r#"You are Deep Research, an AI that does thorough research.

You have tools to help:
{tool_descriptions}

For simple questions, answer directly.
For research questions, use web_search to find facts.
For analysis questions, use think_deeply to reason through it.

Be helpful, accurate, and cite your sources."#,
        tool_descriptions = tool_descriptions
    );

    match category {
        Category::General => {}
        Category::Code => prompt.push_str(
            r#"

You specialize in coding tasks. When writing code:
- Include comments explaining complex logic
- Consider edge cases and error handling
- Suggest tests when appropriate"#,
        ),
        Category::Reasoning => prompt.push_str(
            r#"

For complex analysis:
- Break down problems step by step
- Consider multiple perspectives and trade-offs
- Identify assumptions and limitations
- Support conclusions with evidence"#,
        ),
    }

    prompt
}
