//! One-shot question command.

use crate::agent::build_agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::content::ContentBlock;
use crate::credentials::EnvCredentialSource;
use crate::error::TenkiError;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    json: bool,
    mut settings: Settings,
) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Err(TenkiError::InvalidInput("question is empty".to_string()).into());
    }

    if let Err(e) = preflight::check(Operation::Chat, &settings).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.model.model = model;
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let credentials = EnvCredentialSource::from_settings(&settings.model);
    let agent = build_agent(&settings, &prompts, &credentials).await?;

    let spinner = Output::spinner("Checking the weather...");
    let result = agent.invoke(question).await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response.content)?);
        return Ok(());
    }

    println!("\n{}\n", response.final_text().unwrap_or_default());

    let tool_calls: Vec<_> = response
        .content
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } => Some(format!("{} {}", name, input)),
            _ => None,
        })
        .collect();

    if !tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", tool_calls.len()));
        for call in &tool_calls {
            Output::kv("call", call);
        }
        println!();
    }

    Output::info(&format!("Completed in {} iteration(s)", response.iterations));

    Ok(())
}
