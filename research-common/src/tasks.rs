//! Task queue envelope types
//!
//! The broker is the `task_queue` table: the API inserts PENDING rows, the
//! worker claims them and writes the outcome back into the same row, which
//! doubles as the result backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Names of the jobs the worker knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskName {
    #[serde(rename = "process_document")]
    ProcessDocument,
    #[serde(rename = "ai_analysis_task")]
    AiAnalysis,
    #[serde(rename = "health_check_task")]
    HealthCheck,
    #[serde(rename = "debug_task")]
    Debug,
}

impl TaskName {
    pub const ALL: [TaskName; 4] = [
        TaskName::ProcessDocument,
        TaskName::AiAnalysis,
        TaskName::HealthCheck,
        TaskName::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::ProcessDocument => "process_document",
            TaskName::AiAnalysis => "ai_analysis_task",
            TaskName::HealthCheck => "health_check_task",
            TaskName::Debug => "debug_task",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown task: {}", s)))
    }
}

/// Task lifecycle state. Only moves forward:
/// PENDING → STARTED → SUCCESS | FAILURE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Started,
    Success,
    Failure,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Started => "STARTED",
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Failure => "FAILURE",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failure)
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TaskStatus::Pending),
            "STARTED" => Ok(TaskStatus::Started),
            "SUCCESS" => Ok(TaskStatus::Success),
            "FAILURE" => Ok(TaskStatus::Failure),
            other => Err(Error::Internal(format!("Unknown task status: {}", other))),
        }
    }
}

/// One broker row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: Uuid,
    /// Kept as text: rows written by other producers may carry names this
    /// build does not know, and the worker fails those explicitly
    pub name: String,
    /// Positional arguments (JSON array)
    pub args: serde_json::Value,
    /// Keyword arguments (JSON object)
    pub kwargs: serde_json::Value,
    pub status: TaskStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Identity of the worker that claimed the task
    pub worker: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
