//! CLI module for Tenki.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tenki - a weather chat agent
///
/// Ask about the weather anywhere; the agent looks up the place and its
/// forecast before answering.
#[derive(Parser, Debug)]
#[command(name = "tenki")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask (e.g., "Will it rain in Osaka this weekend?")
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Print the answer and tool calls as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP chat API
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the tools offered to the model
    Tools {
        /// Print the full input schemas
        #[arg(long)]
        schema: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["tenki", "-vv", "ask", "Weather in Tokyo?", "--json"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, json, model } => {
                assert_eq!(question, "Weather in Tokyo?");
                assert!(json);
                assert!(model.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::parse_from(["tenki", "serve"]);
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert!(port.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
