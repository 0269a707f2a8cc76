//! API description endpoints (`/api/info/` and the `/api/` root)

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::services::Agent;
use crate::AppState;

/// GET /api/info/, GET /api/
pub async fn api_info() -> Json<Value> {
    let ai_agents: serde_json::Map<String, Value> = Agent::ALL
        .iter()
        .map(|agent| (agent.as_str().to_string(), json!("Ready for integration")))
        .collect();

    Json(json!({
        "name": "Multi-Agent Research Platform API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "API for AI-powered research platform",
        "endpoints": {
            "health": "/api/health/",
            "info": "/api/info/",
            "sessions": "/api/sessions/",
            "chat": "/api/chat/message",
            "agents": "/api/chat/agents",
            "tasks": "/api/tasks/",
            "research_statements": "/api/research-statements/",
            "evidence": "/api/evidence/",
        },
        "ai_agents": ai_agents,
        "features": [
            "Document processing",
            "AI agent orchestration",
            "Research workflow management",
            "Real-time collaboration",
        ],
    }))
}

pub fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/api/info/", get(api_info))
        .route("/api/", get(api_info))
}
