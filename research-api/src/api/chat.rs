//! Chat endpoints: send a message to a simulated agent, list agents

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use research_common::db::{messages, sessions, ChatMessage, MessageRole, NewMessage, NewSession};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::{Agent, AgentInfo, AgentStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Existing session; a new one is created when absent
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub content: String,
    /// claude, chatgpt, grok or auto (default claude)
    #[serde(default)]
    pub agent_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatExchange {
    pub session_id: Uuid,
    pub user_message: ChatMessage,
    pub reply: ChatMessage,
}

fn parse_agent(agent_type: Option<&str>) -> ApiResult<Agent> {
    match agent_type {
        None => Ok(Agent::Claude),
        Some(name) => Agent::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown agent type: {}", name))),
    }
}

/// POST /api/chat/message
///
/// Stores the user message and the agent's reply together.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Json<ChatExchange>> {
    let Json(request) = payload?;
    let agent = parse_agent(request.agent_type.as_deref())?;
    let user_message = NewMessage::new(MessageRole::User, request.content);
    user_message.validate()?;

    if let Some(id) = request.session_id {
        sessions::require_session(&state.db, id).await?;
    }

    let mut tx = state.db.begin().await?;
    let session_id = match request.session_id {
        Some(id) => id,
        None => {
            let session = sessions::create_session(&mut *tx, NewSession::default()).await?;
            tracing::info!(session_id = %session.id, "Created research session for chat");
            session.id
        }
    };

    let reply_text = agent.reply(&user_message.content);
    let user_message = messages::insert_message(&mut *tx, session_id, user_message).await?;
    let reply = messages::insert_message(
        &mut *tx,
        session_id,
        NewMessage::new(agent.role(), reply_text).with_metadata(agent.reply_metadata()),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(session_id = %session_id, agent = agent.as_str(), "Chat exchange stored");

    Ok(Json(ChatExchange {
        session_id,
        user_message,
        reply,
    }))
}

/// GET /api/chat/agents
pub async fn list_agents() -> Json<Vec<AgentInfo>> {
    Json(Agent::ALL.iter().map(Agent::info).collect())
}

/// GET /api/chat/agents/:agent/status
pub async fn agent_status(
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<AgentStatus>> {
    let Path(agent) = path?;
    let resolved = match agent.to_lowercase().as_str() {
        // `auto` is a routing hint, not an agent
        "auto" => None,
        _ => Agent::parse(&agent),
    };
    resolved
        .map(|agent| Json(AgentStatus::online(agent)))
        .ok_or_else(|| ApiError::NotFound(format!("Agent {}", agent)))
}

pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat/message", post(send_message))
        .route("/api/chat/agents", get(list_agents))
        .route("/api/chat/agents/:agent/status", get(agent_status))
}
