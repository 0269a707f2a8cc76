//! Evidence endpoints: curated evidence items, their reliability, tags and
//! links to research statements

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
    evidence, sessions, statements, Evidence, EvidenceStatistics, EvidenceType, LinkType,
    NewEvidence,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::evidence_sentences;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkClaimRequest {
    pub claim_id: Uuid,
    pub link_type: LinkType,
}

#[derive(Debug, Deserialize)]
pub struct ReliabilityRequest {
    pub score: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractTextRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractedEvidence {
    pub evidence: Vec<String>,
}

fn evidence_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Evidence {}", id))
}

/// POST /api/evidence/
pub async fn create_evidence(
    State(state): State<AppState>,
    payload: Result<Json<NewEvidence>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Evidence>)> {
    let Json(new) = payload?;
    sessions::require_session(&state.db, new.session_id).await?;

    let item = evidence::create_evidence(&state.db, new).await?;
    tracing::info!(
        session_id = %item.session_id,
        evidence_id = %item.id,
        evidence_type = %item.evidence_type,
        reliability = item.reliability_score,
        "Created evidence"
    );
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/evidence/:id/
pub async fn get_evidence(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Evidence>> {
    let Path(id) = path?;
    evidence::get_evidence(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| evidence_not_found(id))
}

/// GET /api/evidence/session/:session_id/
pub async fn list_session_evidence(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Evidence>>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(evidence::list_evidence(&state.db, session_id).await?))
}

/// GET /api/evidence/session/:session_id/type/:evidence_type/
pub async fn list_evidence_by_type(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> ApiResult<Json<Vec<Evidence>>> {
    let Path((session_id, evidence_type)) = path?;
    let evidence_type: EvidenceType = evidence_type.parse()?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(
        evidence::list_evidence_by_type(&state.db, session_id, evidence_type).await?,
    ))
}

/// GET /api/evidence/session/:session_id/claim/:claim_id/
pub async fn evidence_for_claim(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Json<Vec<Evidence>>> {
    let Path((session_id, claim_id)) = path?;
    sessions::require_session(&state.db, session_id).await?;
    statements::require_statement_in_session(&state.db, session_id, claim_id).await?;
    Ok(Json(
        evidence::evidence_for_claim(&state.db, session_id, claim_id).await?,
    ))
}

/// GET /api/evidence/session/:session_id/search/?q=
pub async fn search_evidence(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Evidence>>> {
    let Path(session_id) = path?;
    let Query(params) = query?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(
        evidence::search_evidence(&state.db, session_id, &params.q).await?,
    ))
}

/// GET /api/evidence/session/:session_id/statistics/
pub async fn evidence_statistics(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<EvidenceStatistics>> {
    let Path(session_id) = path?;
    sessions::require_session(&state.db, session_id).await?;
    Ok(Json(evidence::evidence_statistics(&state.db, session_id).await?))
}

/// POST /api/evidence/:id/link-claim/
pub async fn link_claim(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<LinkClaimRequest>, JsonRejection>,
) -> ApiResult<Json<Evidence>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let item = evidence::link_claim(&state.db, id, request.claim_id, request.link_type)
        .await?
        .ok_or_else(|| evidence_not_found(id))?;

    tracing::info!(
        evidence_id = %id,
        claim_id = %request.claim_id,
        link_type = %request.link_type,
        "Linked evidence to claim"
    );
    Ok(Json(item))
}

/// PUT /api/evidence/:id/reliability/
pub async fn update_reliability(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReliabilityRequest>, JsonRejection>,
) -> ApiResult<Json<Evidence>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    evidence::update_reliability(&state.db, id, request.score, request.reason)
        .await?
        .map(Json)
        .ok_or_else(|| evidence_not_found(id))
}

/// POST /api/evidence/:id/tags/
pub async fn add_tags(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TagsRequest>, JsonRejection>,
) -> ApiResult<Json<Evidence>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    evidence::add_tags(&state.db, id, request.tags)
        .await?
        .map(Json)
        .ok_or_else(|| evidence_not_found(id))
}

/// POST /api/evidence/extract/
///
/// Returns the evidence sentences of free text without storing them.
pub async fn extract_from_text(
    payload: Result<Json<ExtractTextRequest>, JsonRejection>,
) -> ApiResult<Json<ExtractedEvidence>> {
    let Json(request) = payload?;
    let sentences = evidence_sentences(&request.text)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(Json(ExtractedEvidence { evidence: sentences }))
}

pub fn evidence_routes() -> Router<AppState> {
    Router::new()
        .route("/api/evidence/", post(create_evidence))
        .route("/api/evidence/extract/", post(extract_from_text))
        .route("/api/evidence/:id/", get(get_evidence))
        .route("/api/evidence/:id/link-claim/", post(link_claim))
        .route("/api/evidence/:id/reliability/", put(update_reliability))
        .route("/api/evidence/:id/tags/", post(add_tags))
        .route(
            "/api/evidence/session/:session_id/",
            get(list_session_evidence),
        )
        .route(
            "/api/evidence/session/:session_id/type/:evidence_type/",
            get(list_evidence_by_type),
        )
        .route(
            "/api/evidence/session/:session_id/claim/:claim_id/",
            get(evidence_for_claim),
        )
        .route(
            "/api/evidence/session/:session_id/search/",
            get(search_evidence),
        )
        .route(
            "/api/evidence/session/:session_id/statistics/",
            get(evidence_statistics),
        )
}
