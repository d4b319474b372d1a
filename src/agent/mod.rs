//! Agent module - the research control loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt, history and the user message
//! 2. Call the LLM with the available tools
//! 3. If the LLM requests tool calls, execute them and feed the results back
//! 4. Repeat until the LLM produces a final answer or the iteration cap is hit

mod agent_loop;
mod conversation;
mod events;
mod prompt;
pub mod selector;

pub use agent_loop::{render_tool_outcome, Agent, AgentError};
pub use conversation::{Conversation, LoopState};
pub use events::AgentEvent;
pub use prompt::build_system_prompt;
