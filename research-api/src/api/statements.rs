//! Research statement endpoints
//!
//! A statement is drafted, refined and broken into subquestions; at most
//! the newest ACTIVE statement is reported as the session's focus.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use research_common::db::{
    sessions, statements, NewStatement, ResearchStatement, StatementRefinement,
    StatementStatistics, StatementStatus, StatementType,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::generate_subquestions;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct SubquestionsRequest {
    pub subquestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: StatementStatus,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub research_statement: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedSubquestions {
    pub subquestions: Vec<String>,
}

fn statement_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Research statement {}", id))
}

/// POST /api/research-statements/
pub async fn create_statement(
    State(state): State<AppState>,
    payload: Result<Json<NewStatement>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ResearchStatement>)> {
    let Json(new) = payload?;
    sessions::require_session(&state.db, new.session_id).await?;

    let statement = statements::create_statement(&state.db, new).await?;
    tracing::info!(
        session_id = %statement.session_id,
        statement_id = %statement.id,
        statement_type = %statement.statement_type,
        "Created research statement"
    );
    Ok((StatusCode::CREATED, Json(statement)))
}

/// GET /api/research-statements/:id/
pub async fn get_statement(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ResearchStatement>> {
    let Path(id) = path?;
    statements::get_statement(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| statement_not_found(id))
}

/// GET /api/research-statements/session/:session_id/
pub async fn list_session_statements(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<ResearchStatement>>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(statements::list_statements(&state.db, session_id, None).await?))
}

/// GET /api/research-statements/session/:session_id/type/:statement_type/
pub async fn list_statements_by_type(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> ApiResult<Json<Vec<ResearchStatement>>> {
    let Path((session_id, statement_type)) = path?;
    let statement_type: StatementType = statement_type.parse()?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(
        statements::list_statements(&state.db, session_id, Some(statement_type)).await?,
    ))
}

/// GET /api/research-statements/session/:session_id/active/
pub async fn active_statement(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ResearchStatement>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    statements::active_statement(&state.db, session_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Active research statement of session {}", session_id))
        })
}

/// GET /api/research-statements/session/:session_id/search/?q=
pub async fn search_statements(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<ResearchStatement>>> {
    let Path(session_id) = path?;
    let Query(params) = query?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(
        statements::search_statements(&state.db, session_id, &params.q).await?,
    ))
}

/// GET /api/research-statements/session/:session_id/statistics/
pub async fn statement_statistics(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<StatementStatistics>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(statements::statement_statistics(&state.db, session_id).await?))
}

/// PUT /api/research-statements/:id/refine/
pub async fn refine_statement(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatementRefinement>, JsonRejection>,
) -> ApiResult<Json<ResearchStatement>> {
    let Path(id) = path?;
    let Json(refinement) = payload?;
    statements::refine_statement(&state.db, id, refinement)
        .await?
        .map(Json)
        .ok_or_else(|| statement_not_found(id))
}

/// POST /api/research-statements/:id/subquestions/
pub async fn add_subquestions(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubquestionsRequest>, JsonRejection>,
) -> ApiResult<Json<ResearchStatement>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    statements::add_subquestions(&state.db, id, request.subquestions)
        .await?
        .map(Json)
        .ok_or_else(|| statement_not_found(id))
}

/// PUT /api/research-statements/:id/status/
pub async fn update_status(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<ResearchStatement>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    statements::update_status(&state.db, id, request.status)
        .await?
        .map(Json)
        .ok_or_else(|| statement_not_found(id))
}

/// POST /api/research-statements/generate-subquestions/
///
/// Suggestions only; nothing is stored.
pub async fn suggest_subquestions(
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GeneratedSubquestions>> {
    let Json(request) = payload?;
    if request.research_statement.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "research_statement must not be empty".to_string(),
        ));
    }
    Ok(Json(GeneratedSubquestions {
        subquestions: generate_subquestions(&request.research_statement),
    }))
}

pub fn statement_routes() -> Router<AppState> {
    Router::new()
        .route("/api/research-statements/", post(create_statement))
        .route(
            "/api/research-statements/generate-subquestions/",
            post(suggest_subquestions),
        )
        .route("/api/research-statements/:id/", get(get_statement))
        .route("/api/research-statements/:id/refine/", put(refine_statement))
        .route(
            "/api/research-statements/:id/subquestions/",
            post(add_subquestions),
        )
        .route("/api/research-statements/:id/status/", put(update_status))
        .route(
            "/api/research-statements/session/:session_id/",
            get(list_session_statements),
        )
        .route(
            "/api/research-statements/session/:session_id/type/:statement_type/",
            get(list_statements_by_type),
        )
        .route(
            "/api/research-statements/session/:session_id/active/",
            get(active_statement),
        )
        .route(
            "/api/research-statements/session/:session_id/search/",
            get(search_statements),
        )
        .route(
            "/api/research-statements/session/:session_id/statistics/",
            get(statement_statistics),
        )
}
