//! HTTP chat API for web front ends.
//!
//! Each session gets its own transcript and agent. Sessions live in memory
//! only: they are removed by `DELETE`, by the idle sweep, or when the
//! server stops.

use crate::agent::{Agent, ModelClient, OpenAiModel};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{ChatPrompts, Prompts, Settings};
use crate::credentials::{CredentialSource, EnvCredentialSource};
use crate::session::{ChatSession, Message, Rejection, SubmitOutcome};
use crate::tools::{ToolDefinition, ToolRegistry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    sessions: RwLock<HashMap<Uuid, Arc<ChatSession>>>,
    model: Arc<dyn ModelClient>,
    tools: ToolRegistry,
    system_prompt: String,
    replies: ChatPrompts,
    max_tool_iterations: usize,
}

impl AppState {
    fn new_session(&self) -> (Uuid, Arc<ChatSession>) {
        let agent = Agent::new(self.model.clone(), self.tools.clone(), &self.system_prompt)
            .with_max_tool_iterations(self.max_tool_iterations);
        let session = Arc::new(ChatSession::with_agent(agent, self.replies.clone()));
        let id = Uuid::new_v4();

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, session.clone());
        (id, session)
    }

    fn session(&self, id: &Uuid) -> Option<Arc<ChatSession>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn remove(&self, id: &Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Drop sessions with no activity for at least `ttl`. Busy sessions are kept.
    fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| {
            let idle = (now - session.last_activity()).to_std().unwrap_or_default();
            session.is_busy() || idle < ttl
        });
        before - sessions.len()
    }
}

/// Periodically evict idle sessions.
fn spawn_idle_sweep(state: Arc<AppState>, ttl: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ttl.min(Duration::from_secs(60)));
        loop {
            ticker.tick().await;
            let evicted = state.evict_idle(ttl);
            if evicted > 0 {
                info!("Evicted {} idle session(s)", evicted);
            }
        }
    })
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings).await {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let credentials = EnvCredentialSource::from_settings(&settings.model).fetch().await?;
    let model = OpenAiModel::new(&credentials, &settings.model.model, settings.model.timeout())?;
    let tools = ToolRegistry::weather(&settings.tools)?;

    let state = Arc::new(AppState {
        sessions: RwLock::new(HashMap::new()),
        model: Arc::new(model),
        tools,
        system_prompt: prompts.system_prompt(),
        replies: prompts.chat,
        max_tool_iterations: settings.model.max_tool_iterations,
    });

    if let Some(ttl) = settings.server.session_ttl() {
        debug!("Idle sessions expire after {:?}", ttl);
        spawn_idle_sweep(state.clone(), ttl);
    }

    let host = host.unwrap_or(settings.server.host);
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tenki API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Tools", "GET  /tools");
    Output::kv("New session", "POST /sessions");
    Output::kv("Transcript", "GET  /sessions/:id/messages");
    Output::kv("Send message", "POST /sessions/:id/messages");
    Output::kv("End session", "DELETE /sessions/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving with model {}", settings.model.model);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/messages", get(get_messages).post(post_message))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct PostMessageRequest {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SessionResponse {
    id: Uuid,
    busy: bool,
    messages: Vec<Message>,
}

impl SessionResponse {
    fn new(id: Uuid, session: &ChatSession) -> Self {
        Self {
            id,
            busy: session.is_busy(),
            messages: session.messages(),
        }
    }
}

#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolDefinition>,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ToolsResponse {
        tools: state.tools.definitions(),
    })
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (id, session) = state.new_session();
    info!("Created session {}", id);
    (StatusCode::CREATED, Json(SessionResponse::new(id, &session)))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if state.remove(&id) {
        info!("Deleted session {}", id);
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
    }
}

async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.session(&id) {
        Some(session) => Json(SessionResponse::new(id, &session)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id)),
    }
}

async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> impl IntoResponse {
    let Some(session) = state.session(&id) else {
        return error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id));
    };

    // The turn runs on its own task so a client disconnect cannot cut it short.
    let turn = tokio::spawn({
        let session = session.clone();
        async move { session.submit(&req.text).await }
    });
    let outcome = match turn.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Turn task for session {} failed: {}", id, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "turn failed".to_string());
        }
    };

    match outcome {
        SubmitOutcome::Completed => Json(SessionResponse::new(id, &session)).into_response(),
        SubmitOutcome::Rejected(reason @ Rejection::Empty) => {
            error_response(StatusCode::BAD_REQUEST, reason.to_string())
        }
        SubmitOutcome::Rejected(reason @ Rejection::Busy) => {
            error_response(StatusCode::CONFLICT, reason.to_string())
        }
    }
}
