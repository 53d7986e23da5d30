//! Interactive chat command.

use crate::agent::build_agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::credentials::EnvCredentialSource;
use crate::error::{Result, TenkiError};
use crate::session::{ChatSession, Rejection, Role, SubmitOutcome};
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings).await {
        Output::error(&format!("{}", e));
        return Err(e);
    }

    if let Some(model) = model {
        settings.model.model = model;
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let session = Arc::new(ChatSession::new(prompts.chat.clone()));
    let mut init = Some(spawn_agent_init(session.clone(), settings, prompts));

    println!("\n{}", style("Tenki Chat").bold().cyan());
    println!("{}\n", style("Ask about the weather, or type 'exit' to quit.").dim());

    for message in session.messages() {
        Output::message(&message);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        // Surface a failed agent start instead of answering "not ready" forever.
        if init.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = init.take() {
                if let Err(e) = join_init(handle).await {
                    Output::error(&format!("Failed to start the agent: {}", e));
                    return Err(e);
                }
            }
        }

        let before = session.len();
        let spinner = Output::spinner("Thinking...");
        let outcome = session.submit(input).await;
        spinner.finish_and_clear();

        match outcome {
            SubmitOutcome::Completed => {
                println!();
                for message in session.messages_since(before) {
                    if message.role == Role::Assistant {
                        Output::message(&message);
                    }
                }
            }
            SubmitOutcome::Rejected(Rejection::Empty) => continue,
            SubmitOutcome::Rejected(reason) => Output::warning(&format!("Not sent: {}", reason)),
        }
    }

    Ok(())
}

/// Build the agent in the background and attach it to the session when ready.
fn spawn_agent_init(
    session: Arc<ChatSession>,
    settings: Settings,
    prompts: Prompts,
) -> JoinHandle<Result<()>> {
    tokio::spawn(async move {
        let credentials = EnvCredentialSource::from_settings(&settings.model);
        let agent = build_agent(&settings, &prompts, &credentials).await?;
        session.attach_agent(agent);
        Ok(())
    })
}

async fn join_init(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle
        .await
        .map_err(|e| TenkiError::Config(format!("agent initialization aborted: {}", e)))?
}
