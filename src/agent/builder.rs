//! Construction of a production agent from configuration.

use super::{Agent, OpenAiModel};
use crate::config::{Prompts, Settings};
use crate::credentials::CredentialSource;
use crate::error::Result;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tracing::info;

/// Fetch credentials and build an agent with the configured model and weather tools.
pub async fn build_agent(
    settings: &Settings,
    prompts: &Prompts,
    credentials: &dyn CredentialSource,
) -> Result<Agent> {
    let credentials = credentials.fetch().await?;
    let model = OpenAiModel::new(&credentials, &settings.model.model, settings.model.timeout())?;
    let tools = ToolRegistry::weather(&settings.tools)?;

    info!(
        "Agent ready with model {} and {} tool(s)",
        settings.model.model,
        tools.len()
    );

    Ok(Agent::new(Arc::new(model), tools, &prompts.system_prompt())
        .with_max_tool_iterations(settings.model.max_tool_iterations))
}
