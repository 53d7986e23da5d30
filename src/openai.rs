//! OpenAI client configuration.

use crate::credentials::ModelCredentials;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client bound to the given credentials.
///
/// Every request is bounded by `timeout` to prevent hung API calls.
pub fn create_client(credentials: &ModelCredentials, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new().with_api_key(credentials.api_key.clone());
    if let Some(base) = &credentials.api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}
