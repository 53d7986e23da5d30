//! Agent system for answering weather questions with tool calling.
//!
//! Provides an LLM agent that can look up locations and forecasts before
//! answering, and the model abstraction it talks to.

mod builder;
mod model;
mod runner;

pub use builder::build_agent;
pub use model::{
    ContextEntry, ModelClient, ModelRequest, ModelResponse, OpenAiModel, ToolCallRequest,
};
pub use runner::{Agent, AgentResponse, DEFAULT_MAX_TOOL_ITERATIONS};
