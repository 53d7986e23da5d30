//! Tools command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::ToolRegistry;
use anyhow::Result;

/// List the tools the agent offers to the model.
pub async fn run_tools(schema: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::ListTools, &settings).await?;

    let registry = ToolRegistry::weather(&settings.tools)?;

    Output::header(&format!("Tools ({})", registry.len()));
    for definition in registry.definitions() {
        Output::kv(&definition.name, &definition.description);
        if schema {
            println!("{}\n", serde_json::to_string_pretty(&definition.input_schema)?);
        }
    }

    if settings.tools.openweather_key().is_none() {
        println!();
        Output::info("Set tools.openweather_api_key to enable getCurrentWeather.");
    }

    Ok(())
}
