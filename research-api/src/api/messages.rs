//! Chat message endpoints of a session

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use research_common::db::{messages, sessions, ChatMessage, NewMessage};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::AppState;

/// GET /api/sessions/:id/messages/
pub async fn list_messages(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    let messages = messages::list_messages(&state.db, session_id).await?;
    Ok(Json(messages))
}

/// POST /api/sessions/:id/messages/
pub async fn create_message(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let Path(session_id) = path?;
    let Json(new) = payload?;
    sessions::require_session(&state.db, session_id).await?;
    let message = messages::insert_message(&state.db, session_id, new).await?;
    tracing::debug!(session_id = %session_id, message_id = %message.id, role = %message.role, "Stored message");
    Ok((StatusCode::CREATED, Json(message)))
}

pub fn message_routes() -> Router<AppState> {
    Router::new().route(
        "/api/sessions/:id/messages/",
        get(list_messages).post(create_message),
    )
}
