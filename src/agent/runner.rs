//! Agent runner with tool calling loop.

use super::model::{ContextEntry, ModelClient, ModelRequest};
use crate::content::{ContentBlock, ToolStatus};
use crate::error::AgentError;
use crate::tools::{ToolDefinition, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of tool rounds allowed within one turn.
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 8;

/// Agent that answers one utterance at a time, calling tools as the model asks.
///
/// Holds no conversation state between calls: every `invoke` starts from the
/// system prompt and the new user text.
pub struct Agent {
    model: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    definitions: Vec<ToolDefinition>,
    system_prompt: String,
    max_tool_iterations: usize,
}

impl Agent {
    /// Create a new agent bound to a model and a tool set.
    pub fn new(model: Arc<dyn ModelClient>, tools: ToolRegistry, system_prompt: &str) -> Self {
        let definitions = tools.definitions();
        Self {
            model,
            tools,
            definitions,
            system_prompt: system_prompt.to_string(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Set the maximum number of tool rounds for one turn.
    pub fn with_max_tool_iterations(mut self, max: usize) -> Self {
        self.max_tool_iterations = max.max(1);
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer `user_text`.
    ///
    /// Tool failures are reported back to the model and never abort the turn.
    /// Fails when the model is unreachable or keeps requesting tools beyond
    /// the configured limit.
    pub async fn invoke(&self, user_text: &str) -> Result<AgentResponse, AgentError> {
        let mut context = vec![ContextEntry::User(user_text.to_string())];
        let mut content = Vec::new();
        let mut iterations = 0;
        let mut tool_rounds = 0;

        loop {
            iterations += 1;
            debug!("Agent iteration {}", iterations);

            let response = self
                .model
                .complete(ModelRequest {
                    system_prompt: &self.system_prompt,
                    context: &context,
                    tools: &self.definitions,
                })
                .await?;

            if response.tool_calls.is_empty() {
                let text = response.text.ok_or(AgentError::EmptyResponse)?;
                content.push(ContentBlock::text(text));
                return Ok(AgentResponse {
                    content,
                    iterations,
                });
            }

            tool_rounds += 1;
            if tool_rounds > self.max_tool_iterations {
                warn!(
                    "Agent exceeded maximum tool iterations ({})",
                    self.max_tool_iterations
                );
                return Err(AgentError::ToolLoopExceeded {
                    limit: self.max_tool_iterations,
                });
            }

            if let Some(text) = &response.text {
                content.push(ContentBlock::text(text.clone()));
            }
            context.push(ContextEntry::Assistant {
                text: response.text.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            for call in response.tool_calls {
                content.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });

                let (status, payload) = match self.tools.invoke(&call.name, call.arguments).await {
                    Ok(output) => (ToolStatus::Success, output),
                    Err(e) => (ToolStatus::Error, json!({ "error": e.to_string() })),
                };
                info!("Tool {} finished with {}", call.name, status);

                context.push(ContextEntry::ToolResult {
                    call_id: call.id.clone(),
                    content: tool_result_text(&payload),
                });
                content.push(ContentBlock::ToolResult {
                    tool_use_id: call.id,
                    status,
                    payload,
                });
            }
        }
    }
}

fn tool_result_text(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Response from one agent turn.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Tool use/result pairs in call order, followed by the final text.
    pub content: Vec<ContentBlock>,
    /// Number of model calls used.
    pub iterations: usize,
}

impl AgentResponse {
    /// The final answer text.
    pub fn final_text(&self) -> Option<&str> {
        self.content.iter().rev().find_map(ContentBlock::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::{ModelResponse, ToolCallRequest};
    use crate::error::ToolError;
    use crate::tools::Tool;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays queued responses and records every request's context.
    struct ScriptedModel {
        responses: Mutex<VecDeque<Result<ModelResponse, AgentError>>>,
        seen: Mutex<Vec<Vec<ContextEntry>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<ModelResponse, AgentError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, AgentError> {
            self.seen.lock().unwrap().push(request.context.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ModelResponse::tool_call("loop", "forecast", json!({}))))
        }
    }

    struct FakeForecast {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Tool for FakeForecast {
        fn name(&self) -> &'static str {
            "forecast"
        }

        fn description(&self) -> &'static str {
            "Fake forecast"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn invoke(&self, _input: Value) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ToolError::invocation("forecast", "HTTP 500"))
            } else {
                Ok(json!({"current_weather": {"temperature": 21.0}}))
            }
        }
    }

    fn agent(model: Arc<ScriptedModel>, fail: bool) -> (Agent, Arc<FakeForecast>) {
        let tool = Arc::new(FakeForecast {
            calls: AtomicUsize::new(0),
            fail,
        });
        let registry = ToolRegistry::new(vec![tool.clone() as Arc<dyn Tool>]).unwrap();
        (Agent::new(model, registry, "You are a weather bot."), tool)
    }

    #[tokio::test]
    async fn test_text_only_response() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::text("Hello!"))]);
        let (agent, tool) = agent(model.clone(), false);

        let response = agent.invoke("hello").await.unwrap();
        assert_eq!(response.content, vec![ContentBlock::text("Hello!")]);
        assert_eq!(response.iterations, 1);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tool_round_then_text() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::tool_call("call_1", "forecast", json!({"lat": 35.68, "lon": 139.76}))),
            Ok(ModelResponse::text("Sunny, 21°C.")),
        ]);
        let (agent, tool) = agent(model.clone(), false);

        let response = agent.invoke("Weather in Tokyo?").await.unwrap();
        assert_eq!(
            response.content,
            vec![
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "forecast".to_string(),
                    input: json!({"lat": 35.68, "lon": 139.76}),
                },
                ContentBlock::ToolResult {
                    tool_use_id: "call_1".to_string(),
                    status: ToolStatus::Success,
                    payload: json!({"current_weather": {"temperature": 21.0}}),
                },
                ContentBlock::text("Sunny, 21°C."),
            ]
        );
        assert_eq!(response.final_text(), Some("Sunny, 21°C."));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);

        // The second model call sees the tool request and its result.
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].len(), 3);
        assert_eq!(
            seen[1][1],
            ContextEntry::Assistant {
                text: None,
                tool_calls: vec![ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "forecast".to_string(),
                    arguments: json!({"lat": 35.68, "lon": 139.76}),
                }],
            }
        );
        assert!(matches!(&seen[1][2], ContextEntry::ToolResult { call_id, .. } if call_id == "call_1"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::tool_call("call_1", "forecast", json!({}))),
            Ok(ModelResponse::text("Sorry, the forecast service is down.")),
        ]);
        let (agent, _) = agent(model.clone(), true);

        let response = agent.invoke("Weather?").await.unwrap();
        match &response.content[1] {
            ContentBlock::ToolResult { status, payload, .. } => {
                assert_eq!(*status, ToolStatus::Error);
                assert_eq!(payload["error"], "forecast failed: HTTP 500");
            }
            other => panic!("expected tool result, got {:?}", other),
        }

        let seen = model.seen.lock().unwrap();
        match &seen[1][2] {
            ContextEntry::ToolResult { content, .. } => assert!(content.contains("HTTP 500")),
            other => panic!("expected tool result context, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let model = ScriptedModel::new(vec![
            Ok(ModelResponse::tool_call("call_1", "getTides", json!({}))),
            Ok(ModelResponse::text("I can't check tides.")),
        ]);
        let (agent, _) = agent(model, false);

        let response = agent.invoke("Tides?").await.unwrap();
        assert!(matches!(
            response.content[1],
            ContentBlock::ToolResult { status: ToolStatus::Error, .. }
        ));
        assert_eq!(response.final_text(), Some("I can't check tides."));
    }

    #[tokio::test]
    async fn test_tool_loop_is_bounded() {
        // The scripted model requests tools forever once its queue is empty.
        let model = ScriptedModel::new(Vec::new());
        let (agent, tool) = agent(model, false);
        let agent = agent.with_max_tool_iterations(3);

        let err = agent.invoke("loop").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolLoopExceeded { limit: 3 }));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_model_unavailable_propagates() {
        let model = ScriptedModel::new(vec![Err(AgentError::ModelUnavailable("403".to_string()))]);
        let (agent, _) = agent(model, false);

        let err = agent.invoke("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_final_response() {
        let model = ScriptedModel::new(vec![Ok(ModelResponse::default())]);
        let (agent, _) = agent(model, false);

        let err = agent.invoke("hi").await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse));
    }
}
