//! research-api library - HTTP surface of the research platform
//!
//! Sessions, chat, artifacts, research statements, evidence and the
//! informational endpoints are served from the shared SQLite database;
//! background work is handed to research-worker through the `task_queue`
//! table.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Deployment label reported by the health endpoint
    pub environment: String,
}

impl AppState {
    /// Create new application state, reading the deployment label from the
    /// environment
    pub fn new(db: SqlitePool) -> Self {
        Self::with_environment(db, research_common::config::environment_label())
    }

    pub fn with_environment(db: SqlitePool, environment: impl Into<String>) -> Self {
        Self {
            db,
            environment: environment.into(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::info_routes())
        .merge(api::session_routes())
        .merge(api::message_routes())
        .merge(api::artifact_routes())
        .merge(api::statement_routes())
        .merge(api::evidence_routes())
        .merge(api::chat_routes())
        .merge(api::task_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
