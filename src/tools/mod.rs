//! Tools the agent can call.
//!
//! Every tool wraps exactly one outbound HTTP request behind a name, a
//! description and a typed input schema. Input is validated before the
//! request is made; failures come back as [`ToolError`] for the agent to
//! report to the model.

mod current_weather;
mod forecast;
mod geocoding;
pub mod schema;

pub use current_weather::{CurrentWeatherInput, CurrentWeatherTool};
pub use forecast::{ForecastInput, ForecastTool, HOURLY_FIELDS};
pub use geocoding::{LocationInput, LocationTool};

use crate::config::ToolSettings;
use crate::error::{Result, ToolError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A named, schema-validated wrapper around one external call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses to request this tool. Unique within a registry.
    fn name(&self) -> &'static str;

    /// Human-readable description the model uses to decide when to call it.
    fn description(&self) -> &'static str;

    /// JSON Schema of the accepted input.
    fn input_schema(&self) -> Value;

    /// Validate `input` and perform the call.
    async fn invoke(&self, input: Value) -> std::result::Result<Value, ToolError>;
}

/// Declaration of a tool as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Immutable set of tools keyed by name.
///
/// Built once when the agent is created and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<BTreeMap<&'static str, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Build a registry from a list of tools. Later duplicates are rejected.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self> {
        let mut map: BTreeMap<&'static str, Arc<dyn Tool>> = BTreeMap::new();
        for tool in tools {
            let name = tool.name();
            if map.insert(name, tool).is_some() {
                return Err(crate::error::TenkiError::Config(format!(
                    "Duplicate tool name: {}",
                    name
                )));
            }
        }
        Ok(Self {
            tools: Arc::new(map),
        })
    }

    /// The weather tools configured by `settings`.
    ///
    /// The current weather tool is only included when an OpenWeather key is set.
    pub fn weather(settings: &ToolSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.clone())
            .build()?;

        let mut tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(LocationTool::new(http.clone(), &settings.geocoding_url)),
            Arc::new(ForecastTool::new(http.clone(), &settings.forecast_url)),
        ];
        if let Some(key) = settings.openweather_key() {
            tools.push(Arc::new(CurrentWeatherTool::new(
                http,
                &settings.current_weather_url,
                key,
            )));
        }

        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Declarations for every tool, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Dispatch a call by name.
    pub async fn invoke(&self, name: &str, input: Value) -> std::result::Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        info!("Calling tool: {} with args: {}", name, input);
        let result = tool.invoke(input).await;
        if let Err(e) = &result {
            warn!("Tool {} failed: {}", name, e);
        }
        result
    }
}

/// Issue a GET request and decode the JSON body.
///
/// Transport errors, non-2xx statuses and undecodable bodies all map to
/// [`ToolError::Invocation`]. No retries.
pub(crate) async fn get_json<Q: Serialize + ?Sized>(
    tool: &str,
    http: &reqwest::Client,
    url: &str,
    query: &Q,
) -> std::result::Result<Value, ToolError> {
    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| ToolError::invocation(tool, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ToolError::invocation(
            tool,
            format!("HTTP {}: {}", status, truncate(&body, 200)),
        ));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| ToolError::invocation(tool, format!("invalid response body: {}", e)))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}
