//! Invocation context handed to every task
//!
//! Bound tasks (`debug_task`) inspect it the way a task-queue "request"
//! object is inspected: id, name, arguments, delivery details.

use chrono::{DateTime, Utc};
use research_common::TaskRecord;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct TaskContext {
    pub task_id: Uuid,
    pub name: String,
    pub args: serde_json::Value,
    pub kwargs: serde_json::Value,
    /// Worker that claimed the task
    pub hostname: String,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Always 0: no retry policy is applied
    pub retries: u32,
}

impl TaskContext {
    pub fn from_record(record: &TaskRecord, hostname: &str) -> Self {
        Self {
            task_id: record.id,
            name: record.name.clone(),
            args: record.args.clone(),
            kwargs: record.kwargs.clone(),
            hostname: hostname.to_string(),
            enqueued_at: record.enqueued_at,
            started_at: record.started_at,
            retries: 0,
        }
    }
}
