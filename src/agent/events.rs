/// Events emitted while the control loop runs in streaming mode.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Assistant text fragment, in generation order.
    TextDelta { content: String },
    /// A tool is about to run.
    ToolCall { id: String, name: String },
    /// A tool finished. Failures are reported to the model, not here.
    ToolResult { id: String, name: String },
}
