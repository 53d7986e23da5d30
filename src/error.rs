//! Error types for Tenki.

use thiserror::Error;

/// Library-level error type for Tenki operations.
#[derive(Error, Debug)]
pub enum TenkiError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failure of a single tool invocation.
///
/// Tool errors are recoverable: the agent feeds them back to the model as an
/// error result instead of aborting the turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    /// Input did not match the tool's schema. Raised before any network call.
    #[error("Invalid input for {tool}: {message}")]
    Validation {
        tool: String,
        fields: Vec<String>,
        message: String,
    },

    /// The outbound call failed (transport, non-2xx status, or undecodable body).
    #[error("{tool} failed: {cause}")]
    Invocation { tool: String, cause: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub(crate) fn invocation(tool: &str, cause: impl std::fmt::Display) -> Self {
        ToolError::Invocation {
            tool: tool.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Failure of a whole agent turn.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The hosted model could not be reached or rejected the request.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Agent exceeded maximum tool iterations ({limit})")]
    ToolLoopExceeded { limit: usize },

    #[error("Model returned neither text nor tool calls")]
    EmptyResponse,

    #[error("Failed to build model request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for Tenki operations.
pub type Result<T> = std::result::Result<T, TenkiError>;
