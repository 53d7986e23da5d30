//! Weekly forecast backed by the Open-Meteo API.

use super::schema::{input_schema, latitude, longitude, validate_input};
use super::{get_json, Tool};
use crate::error::ToolError;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

pub const NAME: &str = "getForecast";

/// Hourly variables requested with every forecast.
pub const HOURLY_FIELDS: [&str; 4] = [
    "relativehumidity_2m",
    "precipitation_probability",
    "weathercode",
    "temperature_80m",
];

const FORECAST_DAYS: u8 = 7;

/// Input for [`ForecastTool`].
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ForecastInput {
    #[schemars(schema_with = "latitude")]
    pub lat: f64,
    #[schemars(schema_with = "longitude")]
    pub lon: f64,
}

/// Fetches current weather plus a 7-day hourly forecast for a coordinate.
pub struct ForecastTool {
    http: reqwest::Client,
    endpoint: String,
}

impl ForecastTool {
    pub fn new(http: reqwest::Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Tool for ForecastTool {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Get weather forecast for a week"
    }

    fn input_schema(&self) -> Value {
        input_schema::<ForecastInput>()
    }

    #[instrument(skip(self, input))]
    async fn invoke(&self, input: Value) -> Result<Value, ToolError> {
        let input: ForecastInput = validate_input(NAME, input)?;

        let query = [
            ("latitude", input.lat.to_string()),
            ("longitude", input.lon.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", HOURLY_FIELDS.join(",")),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ];
        get_json(NAME, &self.http, &self.endpoint, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool(server: &MockServer) -> ForecastTool {
        ForecastTool::new(reqwest::Client::new(), &format!("{}/v1/forecast", server.uri()))
    }

    #[tokio::test]
    async fn test_requests_current_and_hourly_fields() {
        let server = MockServer::start().await;
        let body = json!({
            "latitude": 35.7,
            "longitude": 139.75,
            "current_weather": {"temperature": 18.2, "weathercode": 3},
            "hourly": {"time": [], "weathercode": []}
        });

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "35.68"))
            .and(query_param("longitude", "139.76"))
            .and(query_param("current_weather", "true"))
            .and(query_param(
                "hourly",
                "relativehumidity_2m,precipitation_probability,weathercode,temperature_80m",
            ))
            .and(query_param("forecast_days", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let result = tool(&server)
            .invoke(json!({"lat": 35.68, "lon": 139.76}))
            .await
            .unwrap();
        assert_eq!(result, body);
    }

    #[tokio::test]
    async fn test_string_latitude_never_calls_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = tool(&server)
            .invoke(json!({"lat": "35.68", "lon": 139.76}))
            .await
            .unwrap_err();
        match err {
            ToolError::Validation { fields, .. } => assert_eq!(fields, vec!["lat".to_string()]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_out_of_range_longitude_rejected() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = tool(&server)
            .invoke(json!({"lat": 0.0, "lon": 200.0}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invocation_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = tool(&server)
            .invoke(json!({"lat": 35.68, "lon": 139.76}))
            .await
            .unwrap_err();
        match err {
            ToolError::Invocation { tool, cause } => {
                assert_eq!(tool, NAME);
                assert!(cause.contains("invalid response body"));
            }
            other => panic!("expected invocation error, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_declares_bounds() {
        let schema = ForecastTool::new(reqwest::Client::new(), "http://localhost").input_schema();
        assert_eq!(schema["properties"]["lat"]["minimum"], json!(-90.0));
        assert_eq!(schema["properties"]["lon"]["maximum"], json!(180.0));
    }
}
