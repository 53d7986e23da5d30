//! Configuration module for Tenki.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, ChatPrompts, Prompts};
pub use settings::{
    GeneralSettings, ModelSettings, PromptSettings, ServerSettings, Settings, ToolSettings,
};
