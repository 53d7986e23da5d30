//! Location lookup backed by the Nominatim search API.

use super::schema::{input_schema, validate_input};
use super::{get_json, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

pub const NAME: &str = "getLocation";

/// Input for [`LocationTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LocationInput {
    /// Free-form place name, e.g. "Tokyo" or "Shibuya, Tokyo".
    pub query: String,
}

/// Resolves a place name to coordinates.
///
/// Returns the raw result list. An empty list means "no match" and is not an error.
pub struct LocationTool {
    http: reqwest::Client,
    endpoint: String,
}

impl LocationTool {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Tool for LocationTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Get the location for a given query"
    }

    fn input_schema(&self) -> Value {
        input_schema::<LocationInput>()
    }

    #[instrument(skip(self, input))]
    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let input: LocationInput = validate_input(NAME, input)?;

        let query = [
            ("q", input.query.as_str()),
            ("format", "json"),
            ("limit", "1"),
        ];
        get_json(NAME, &self.http, &self.endpoint, &query).await
    }
}
