//! Hosted model binding.
//!
//! The agent talks to the model through [`ModelClient`], so tests can swap in
//! a scripted model while production uses the OpenAI chat completions API.

use crate::credentials::ModelCredentials;
use crate::error::{AgentError, Result};
use crate::openai::create_client;
use crate::tools::ToolDefinition;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One entry of the model-facing conversation context.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEntry {
    User(String),
    /// A model turn that requested tools.
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult { call_id: String, content: String },
}

/// Everything the model sees for one completion.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    pub context: &'a [ContextEntry],
    pub tools: &'a [ToolDefinition],
}

/// What the model answered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(id: &str, name: &str, arguments: Value) -> Self {
        Self {
            text: None,
            tool_calls: vec![ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
        }
    }
}

/// A hosted completion service that supports tool calls.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> std::result::Result<ModelResponse, AgentError>;
}

/// OpenAI-compatible chat completions model.
pub struct OpenAiModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiModel {
    /// Bind `model` to the given credentials.
    pub fn new(credentials: &ModelCredentials, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(credentials, timeout)?,
            model: model.to_string(),
        })
    }

    fn build_messages(
        &self,
        request: &ModelRequest<'_>,
    ) -> std::result::Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt)
                .build()
                .map_err(invalid_request)?
                .into(),
        ];

        for entry in request.context {
            let message: ChatCompletionRequestMessage = match entry {
                ContextEntry::User(text) => ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()
                    .map_err(invalid_request)?
                    .into(),
                ContextEntry::Assistant { text, tool_calls } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if let Some(text) = text {
                        args.content(text.as_str());
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(tool_calls.iter().map(to_openai_call).collect::<Vec<_>>());
                    }
                    args.build().map_err(invalid_request)?.into()
                }
                ContextEntry::ToolResult { call_id, content } => {
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(call_id.as_str())
                        .content(content.as_str())
                        .build()
                        .map_err(invalid_request)?
                        .into()
                }
            };
            messages.push(message);
        }

        Ok(messages)
    }
}

#[async_trait]
impl ModelClient for OpenAiModel {
    #[instrument(skip(self, request), fields(context = request.context.len()))]
    async fn complete(&self, request: ModelRequest<'_>) -> std::result::Result<ModelResponse, AgentError> {
        let messages = self.build_messages(&request)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_openai_tool).collect::<Vec<_>>());
        }
        let completion = args.build().map_err(invalid_request)?;

        let response = self
            .client
            .chat()
            .create(completion)
            .await
            .map_err(|e| AgentError::ModelUnavailable(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::ModelUnavailable("No choices in model response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                arguments: parse_arguments(&call.function.arguments),
                id: call.id,
                name: call.function.name,
            })
            .collect::<Vec<_>>();

        debug!("Model returned {} tool call(s)", tool_calls.len());

        Ok(ModelResponse {
            text: choice.message.content.filter(|t| !t.trim().is_empty()),
            tool_calls,
        })
    }
}

/// Decode tool arguments. Unparseable arguments are kept as a raw string so
/// the tool's input validation reports them.
fn parse_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return Value::Object(Default::default());
    }
    serde_json::from_str(arguments).unwrap_or_else(|_| Value::String(arguments.to_string()))
}

fn to_openai_call(call: &ToolCallRequest) -> ChatCompletionMessageToolCall {
    ChatCompletionMessageToolCall {
        id: call.id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        },
    }
}

fn to_openai_tool(definition: &ToolDefinition) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: definition.name.clone(),
            description: Some(definition.description.clone()),
            parameters: Some(definition.input_schema.clone()),
            strict: None,
        },
    }
}

fn invalid_request(e: impl std::fmt::Display) -> AgentError {
    AgentError::InvalidRequest(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn model(server: &MockServer) -> OpenAiModel {
        let credentials = ModelCredentials::new("test-key").with_api_base(server.uri());
        OpenAiModel::new(&credentials, "gpt-4o-mini", Duration::from_secs(5)).unwrap()
    }

    fn text_body(text: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
    }

    fn tool_body(id: &str, name: &str, arguments: &str) -> Value {
        json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": {"name": name, "arguments": arguments}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 15, "completion_tokens": 8, "total_tokens": 23}
        })
    }

    #[tokio::test]
    async fn test_text_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi there!")))
            .expect(1)
            .mount(&server)
            .await;

        let context = vec![ContextEntry::User("hello".to_string())];
        let response = model(&server)
            .complete(ModelRequest {
                system_prompt: "Be brief.",
                context: &context,
                tools: &[],
            })
            .await
            .unwrap();

        assert_eq!(response, ModelResponse::text("Hi there!"));
    }

    #[tokio::test]
    async fn test_tool_call_response_declares_tools() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "tools": [{"type": "function", "function": {"name": "getForecast"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_body(
                "call_1",
                "getForecast",
                r#"{"lat":35.68,"lon":139.76}"#,
            )))
            .mount(&server)
            .await;

        let tools = vec![ToolDefinition {
            name: "getForecast".to_string(),
            description: "Get weather forecast for a week".to_string(),
            input_schema: json!({"type": "object"}),
        }];
        let context = vec![ContextEntry::User("weather in Tokyo?".to_string())];
        let response = model(&server)
            .complete(ModelRequest {
                system_prompt: "sys",
                context: &context,
                tools: &tools,
            })
            .await
            .unwrap();

        assert_eq!(response.text, None);
        assert_eq!(
            response.tool_calls,
            vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: "getForecast".to_string(),
                arguments: json!({"lat": 35.68, "lon": 139.76}),
            }]
        );
    }

    #[tokio::test]
    async fn test_unauthorized_is_model_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key", "type": "invalid_request_error", "param": null, "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let context = vec![ContextEntry::User("hi".to_string())];
        let err = model(&server)
            .complete(ModelRequest {
                system_prompt: "sys",
                context: &context,
                tools: &[],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ModelUnavailable(_)));
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"query":"Tokyo"}"#), json!({"query": "Tokyo"}));
        assert_eq!(parse_arguments(""), json!({}));
        assert_eq!(parse_arguments("{lat: 1"), json!("{lat: 1"));
    }
}
