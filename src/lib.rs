//! # Deep Research
//!
//! A small conversational research agent served over HTTP.
//!
//! This library provides:
//! - An HTTP API with request/response and server-sent-event chat endpoints
//! - A tool-based agent loop with web search and deep reasoning tools
//! - Integration with OpenRouter for LLM access and Tavily for search
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a message (plus history) via the API
//! 2. Build context with the system prompt and available tools
//! 3. Call the LLM; if it requests tools, run them and feed the results back
//! 4. Repeat until the LLM answers without tool calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use deep_research::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config);
//! let answer = agent.run("What's new in Rust?", &[], None).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
