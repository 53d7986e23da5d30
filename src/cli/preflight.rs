//! Pre-flight checks before talking to the model.
//!
//! Validates that credentials are available before starting an operation
//! that would otherwise fail on the first message.

use crate::config::Settings;
use crate::credentials::{CredentialSource, EnvCredentialSource};
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chatting, asking and serving need model credentials.
    Chat,
    /// Listing tools needs nothing external.
    ListTools,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub async fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat => {
            EnvCredentialSource::from_settings(&settings.model)
                .fetch()
                .await?;
        }
        Operation::ListTools => {}
    }
    Ok(())
}
