//! Current conditions backed by the OpenWeather API.

use super::schema::{input_schema, latitude, longitude, validate_input};
use super::{get_json, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

pub const NAME: &str = "getCurrentWeather";

/// Input for [`CurrentWeatherTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CurrentWeatherInput {
    #[schemars(schema_with = "latitude")]
    pub lat: f64,
    #[schemars(schema_with = "longitude")]
    pub lon: f64,
}

/// Fetches the weather right now for a coordinate. Requires an API key.
pub struct CurrentWeatherTool {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl CurrentWeatherTool {
    pub fn new(http: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Tool for CurrentWeatherTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Get the current weather for a given latitude and longitude"
    }

    fn input_schema(&self) -> Value {
        input_schema::<CurrentWeatherInput>()
    }

    #[instrument(skip(self, input))]
    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let input: CurrentWeatherInput = validate_input(NAME, input)?;

        let query = [
            ("lat", input.lat.to_string()),
            ("lon", input.lon.to_string()),
            ("appid", self.api_key.clone()),
        ];
        get_json(NAME, &self.http, &self.endpoint, &query).await
    }
}
