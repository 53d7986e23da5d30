//! Model credentials handed over by the identity boundary.
//!
//! Credentials are fetched once and passed into the model client at
//! construction time. They are treated as opaque: nothing here validates
//! or refreshes them.

use crate::config::ModelSettings;
use crate::error::{Result, TenkiError};
use async_trait::async_trait;

/// Credentials for the hosted model.
#[derive(Clone)]
pub struct ModelCredentials {
    pub api_key: String,
    /// Overrides the provider's default endpoint (OpenAI-compatible gateways).
    pub api_base: Option<String>,
}

impl ModelCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

impl std::fmt::Debug for ModelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCredentials")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Source of model credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn fetch(&self) -> Result<ModelCredentials>;
}

/// Reads credentials from the environment variables named in the settings.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    api_key_var: String,
    api_base_var: String,
}

impl EnvCredentialSource {
    pub fn new(api_key_var: &str, api_base_var: &str) -> Self {
        Self {
            api_key_var: api_key_var.to_string(),
            api_base_var: api_base_var.to_string(),
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self::new(&settings.api_key_env, &settings.api_base_env)
    }

    fn read(&self) -> Result<ModelCredentials> {
        let api_key = match std::env::var(&self.api_key_var) {
            Ok(key) if !key.trim().is_empty() => key,
            Ok(_) => {
                return Err(TenkiError::Credentials(format!(
                    "{} is empty. Set it with: export {}='sk-...'",
                    self.api_key_var, self.api_key_var
                )))
            }
            Err(_) => {
                return Err(TenkiError::Credentials(format!(
                    "{} not set. Set it with: export {}='sk-...'",
                    self.api_key_var, self.api_key_var
                )))
            }
        };

        let mut credentials = ModelCredentials::new(api_key);
        if let Ok(base) = std::env::var(&self.api_base_var) {
            if !base.trim().is_empty() {
                credentials = credentials.with_api_base(base);
            }
        }
        Ok(credentials)
    }
}

#[async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn fetch(&self) -> Result<ModelCredentials> {
        self.read()
    }
}
