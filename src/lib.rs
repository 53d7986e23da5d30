//! Tenki - a weather chat agent
//!
//! A small chat assistant that answers weather questions by letting a
//! language model call geocoding and forecast tools.
//!
//! # Architecture
//!
//! - `tools` - HTTP-backed tools the model may call (geocoding, forecast)
//! - `agent` - the model/tool loop that turns a user message into a reply
//! - `session` - a chat transcript with single-flight message submission
//! - `config` - settings and prompt templates
//! - `credentials` - model credentials resolved at construction time
//! - `cli` - the `tenki` command line and HTTP surfaces
//!
//! # Example
//!
//! ```rust,no_run
//! use tenki::agent::build_agent;
//! use tenki::config::{Prompts, Settings};
//! use tenki::credentials::EnvCredentialSource;
//! use tenki::session::ChatSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let prompts = Prompts::load(None, None)?;
//!     let credentials = EnvCredentialSource::from_settings(&settings.model);
//!
//!     let agent = build_agent(&settings, &prompts, &credentials).await?;
//!     let session = ChatSession::with_agent(agent, prompts.chat.clone());
//!
//!     session.submit("Will it rain in Osaka tomorrow?").await;
//!     for message in session.messages() {
//!         println!("{:?}: {}", message.role, message.text());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod content;
pub mod credentials;
pub mod error;
pub mod openai;
pub mod session;
pub mod tools;

pub use error::{Result, TenkiError};
