//! Configuration settings for Tenki.

use crate::error::{Result, TenkiError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub tools: ToolSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Hosted model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Chat model used by the agent.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Environment variable holding an optional API base URL.
    pub api_base_env: String,
    /// Per-request timeout for model calls.
    pub timeout_secs: u64,
    /// Maximum number of tool rounds within one turn.
    pub max_tool_iterations: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base_env: "OPENAI_BASE_URL".to_string(),
            timeout_secs: 120,
            max_tool_iterations: 8,
        }
    }
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tool endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Nominatim search endpoint.
    pub geocoding_url: String,
    /// Open-Meteo forecast endpoint.
    pub forecast_url: String,
    /// OpenWeather current weather endpoint.
    pub current_weather_url: String,
    /// OpenWeather API key. The current weather tool is only offered when set.
    pub openweather_api_key: Option<String>,
    /// Per-request timeout for tool calls.
    pub timeout_secs: u64,
    /// User-Agent sent with tool requests (Nominatim rejects anonymous clients).
    pub user_agent: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            geocoding_url: "https://nominatim.openstreetmap.org/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            current_weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            openweather_api_key: None,
            timeout_secs: 30,
            user_agent: concat!("tenki/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// OpenWeather key, treating an empty string as unset.
    pub fn openweather_key(&self) -> Option<&str> {
        self.openweather_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions idle this long are dropped. 0 keeps them until deleted.
    pub session_ttl_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            session_ttl_secs: 3600,
        }
    }
}

impl ServerSettings {
    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Check that configured endpoints are usable URLs and limits are sane.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("tools.geocoding_url", &self.tools.geocoding_url),
            ("tools.forecast_url", &self.tools.forecast_url),
            ("tools.current_weather_url", &self.tools.current_weather_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| TenkiError::Config(format!("{} is not a valid URL: {}", key, e)))?;
        }

        if self.model.max_tool_iterations == 0 {
            return Err(TenkiError::Config(
                "model.max_tool_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TenkiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tenki")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}
