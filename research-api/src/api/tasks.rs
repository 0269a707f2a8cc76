//! Task endpoints: enqueue background work and poll its result

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use research_common::db::task_queue;
use research_common::{TaskName, TaskRecord, TaskStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::services::Agent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    pub name: String,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub kwargs: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub agent_type: Option<String>,
}

/// Acknowledgement of an enqueued task
#[derive(Debug, Serialize)]
pub struct TaskAccepted {
    pub task_id: Uuid,
    pub name: String,
    pub status: TaskStatus,
}

impl From<TaskRecord> for TaskAccepted {
    fn from(record: TaskRecord) -> Self {
        Self {
            task_id: record.id,
            name: record.name,
            status: record.status,
        }
    }
}

type Accepted = (StatusCode, Json<TaskAccepted>);

async fn enqueue(state: &AppState, name: TaskName, args: Value, kwargs: Value) -> ApiResult<Accepted> {
    let record = task_queue::enqueue(&state.db, name, args, kwargs).await?;
    Ok((StatusCode::ACCEPTED, Json(record.into())))
}

/// POST /api/tasks/
pub async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<EnqueueRequest>, JsonRejection>,
) -> ApiResult<Accepted> {
    let Json(request) = payload?;
    let name: TaskName = request.name.parse()?;
    enqueue(
        &state,
        name,
        request.args.unwrap_or_else(|| json!([])),
        request.kwargs.unwrap_or_else(|| json!({})),
    )
    .await
}

/// POST /api/documents/:document_id/process/
pub async fn process_document(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Accepted> {
    let Path(document_id) = path?;
    enqueue(&state, TaskName::ProcessDocument, json!([document_id]), json!({})).await
}

/// POST /api/documents/:document_id/analyze/
///
/// The body is optional; an empty body analyzes with the default agent.
pub async fn analyze_document(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Accepted> {
    let Path(document_id) = path?;
    let request = parse_optional_json::<AnalyzeRequest>(&headers, &body)?.unwrap_or_default();
    let agent = match request.agent_type.as_deref() {
        None => Agent::Claude,
        Some(name) => Agent::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown agent type: {}", name)))?,
    };

    enqueue(
        &state,
        TaskName::AiAnalysis,
        json!([document_id, agent.as_str()]),
        json!({}),
    )
    .await
}

/// Decode a JSON body that may be absent
///
/// Blank bodies yield `None`. Anything else must be declared as JSON and
/// parse, the same as a required `Json` payload.
fn parse_optional_json<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> ApiResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    if !is_json_content_type(headers) {
        return Err(ApiError::BadRequest(
            "Expected request with `Content-Type: application/json`".to_string(),
        ));
    }
    let Json(value) = Json::<T>::from_bytes(body)?;
    Ok(Some(value))
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// GET /api/tasks/:id/
pub async fn get_task(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<TaskRecord>> {
    let Path(id) = path?;
    task_queue::get_task(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {}", id)))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks/", post(create_task))
        .route("/api/tasks/:id/", get(get_task))
        .route("/api/documents/:document_id/process/", post(process_document))
        .route("/api/documents/:document_id/analyze/", post(analyze_document))
}
