//! Research session endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use research_common::db::{sessions, NewSession, ResearchSession, SessionUpdate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::SessionInsights;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsParams {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Session with the size of its conversation and artifact list
#[derive(Debug, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: ResearchSession,
    pub message_count: i64,
    pub artifact_count: i64,
}

/// POST /api/sessions/
pub async fn create_session(
    State(state): State<AppState>,
    payload: Result<Json<NewSession>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResearchSession>)> {
    let Json(new) = payload?;
    let session = sessions::create_session(&state.db, new).await?;
    tracing::info!(session_id = %session.id, title = %session.title, "Created research session");
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/
pub async fn list_sessions(
    State(state): State<AppState>,
    query: Result<Query<ListSessionsParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ResearchSession>>> {
    let Query(params) = query?;
    let sessions = sessions::list_sessions(&state.db, params.include_inactive).await?;
    Ok(Json(sessions))
}

/// GET /api/sessions/:id/
pub async fn get_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SessionDetail>> {
    let Path(id) = path?;
    let session = sessions::require_session(&state.db, id).await?;
    let (message_count, artifact_count) = sessions::session_counts(&state.db, id).await?;
    Ok(Json(SessionDetail {
        session,
        message_count,
        artifact_count,
    }))
}

/// PATCH /api/sessions/:id/
pub async fn update_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SessionUpdate>, JsonRejection>,
) -> ApiResult<Json<ResearchSession>> {
    let Path(id) = path?;
    let Json(update) = payload?;
    sessions::update_session(&state.db, id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Research session {}", id)))
}

/// POST /api/sessions/:id/deactivate/
pub async fn deactivate_session(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ResearchSession>> {
    let Path(id) = path?;
    sessions::deactivate_session(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Research session {}", id)))
}

/// GET /api/sessions/:id/insights/
pub async fn session_insights(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SessionInsights>> {
    let Path(id) = path?;
    sessions::require_session(&state.db, id).await?;
    let messages = research_common::db::messages::list_messages(&state.db, id).await?;
    Ok(Json(SessionInsights::from_messages(&messages)))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions/", get(list_sessions).post(create_session))
        .route("/api/sessions/:id/", get(get_session).patch(update_session))
        .route("/api/sessions/:id/deactivate/", post(deactivate_session))
        .route("/api/sessions/:id/insights/", get(session_insights))
}
