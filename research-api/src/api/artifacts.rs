//! Research artifact endpoints of a session

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use research_common::db::{artifacts, messages, sessions, Artifact, ArtifactType, NewArtifact};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::extract_evidence;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListArtifactsParams {
    #[serde(rename = "type")]
    pub artifact_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub message_id: Uuid,
}

/// GET /api/sessions/:id/artifacts/
pub async fn list_artifacts(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ListArtifactsParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Artifact>>> {
    let Path(session_id) = path?;
    let Query(params) = query?;
    let artifact_type = params
        .artifact_type
        .as_deref()
        .map(str::parse::<ArtifactType>)
        .transpose()?;

    sessions::require_session(&state.db, session_id).await?;
    let artifacts = artifacts::list_artifacts(&state.db, session_id, artifact_type).await?;
    Ok(Json(artifacts))
}

/// POST /api/sessions/:id/artifacts/
pub async fn create_artifact(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewArtifact>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Artifact>)> {
    let Path(session_id) = path?;
    let Json(new) = payload?;
    sessions::require_session(&state.db, session_id).await?;
    if let Some(message_id) = new.source_message {
        artifacts::validate_source_message(&state.db, session_id, message_id).await?;
    }

    let artifact = artifacts::insert_artifact(&state.db, session_id, new).await?;
    tracing::info!(
        session_id = %session_id,
        artifact_id = %artifact.id,
        artifact_type = %artifact.artifact_type,
        "Created artifact"
    );
    Ok((StatusCode::CREATED, Json(artifact)))
}

/// POST /api/sessions/:id/artifacts/extract/
///
/// Creates one evidence artifact per evidence sentence of the message, in a
/// single transaction.
pub async fn extract_artifacts(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Vec<Artifact>>)> {
    let Path(session_id) = path?;
    let Json(request) = payload?;
    sessions::require_session(&state.db, session_id).await?;
    artifacts::validate_source_message(&state.db, session_id, request.message_id).await?;

    let message = messages::get_message(&state.db, request.message_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Chat message {}", request.message_id)))?;

    let mut tx = state.db.begin().await?;
    let mut created = Vec::new();
    for new in extract_evidence(message.id, &message.content) {
        created.push(artifacts::insert_artifact(&mut *tx, session_id, new).await?);
    }
    tx.commit().await?;

    tracing::info!(
        session_id = %session_id,
        message_id = %message.id,
        count = created.len(),
        "Extracted evidence artifacts"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub fn artifact_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/sessions/:id/artifacts/",
            get(list_artifacts).post(create_artifact),
        )
        .route("/api/sessions/:id/artifacts/extract/", post(extract_artifacts))
}
