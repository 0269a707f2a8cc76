//! Task implementations
//!
//! The document and analysis tasks simulate work with a configurable delay
//! and return canned results; no AI provider is called.

use async_trait::async_trait;
use research_common::config::WorkerConfig;
use research_common::TaskName;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::args::{BoundArgs, Param};
use crate::context::TaskContext;
use crate::error::TaskResult;

/// Agent used by `ai_analysis_task` when none is given
pub const DEFAULT_AGENT: &str = "claude";

/// Confidence reported by every simulated analysis
pub const ANALYSIS_CONFIDENCE: f64 = 0.85;

/// A named job the worker can execute
#[async_trait]
pub trait Task: Send + Sync {
    /// Queue name of the task
    fn name(&self) -> TaskName;

    /// Declared parameters, in positional order
    fn params(&self) -> Vec<Param> {
        Vec::new()
    }

    /// Execute with already-bound arguments; the return value is stored in
    /// the result backend
    async fn run(&self, ctx: &TaskContext, args: &BoundArgs) -> TaskResult<Value>;
}

/// Render an argument the way it appears in log lines and results:
/// strings verbatim, anything else as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `process_document(document_id)`
pub struct ProcessDocumentTask {
    pub delay: Duration,
}

#[async_trait]
impl Task for ProcessDocumentTask {
    fn name(&self) -> TaskName {
        TaskName::ProcessDocument
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::required("document_id")]
    }

    async fn run(&self, ctx: &TaskContext, args: &BoundArgs) -> TaskResult<Value> {
        let document_id = display_value(args.get("document_id"));
        info!(task_id = %ctx.task_id, document_id = %document_id, "Processing document");

        tokio::time::sleep(self.delay).await;

        info!(task_id = %ctx.task_id, document_id = %document_id, "Document processed successfully");
        Ok(Value::String(format!("Document {} processed", document_id)))
    }
}

/// Result record of `ai_analysis_task`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub document_id: Value,
    /// Echoed as given, so non-string agents survive into the result
    pub agent: Value,
    pub analysis: String,
    pub confidence: f64,
    pub insights: Vec<String>,
}

impl AnalysisResult {
    pub fn simulated(document_id: Value, agent: Value) -> Self {
        Self {
            document_id,
            analysis: format!("AI analysis completed by {}", display_value(&agent)),
            agent,
            confidence: ANALYSIS_CONFIDENCE,
            insights: vec![
                "Key finding 1".to_string(),
                "Key finding 2".to_string(),
                "Key finding 3".to_string(),
            ],
        }
    }
}

/// `ai_analysis_task(document_id, agent_type='claude')`
pub struct AiAnalysisTask {
    pub delay: Duration,
}

#[async_trait]
impl Task for AiAnalysisTask {
    fn name(&self) -> TaskName {
        TaskName::AiAnalysis
    }

    fn params(&self) -> Vec<Param> {
        vec![
            Param::required("document_id"),
            Param::optional("agent_type", json!(DEFAULT_AGENT)),
        ]
    }

    async fn run(&self, ctx: &TaskContext, args: &BoundArgs) -> TaskResult<Value> {
        let document_id = args.get("document_id").clone();
        let agent = args.get("agent_type").clone();
        info!(
            task_id = %ctx.task_id,
            agent = %display_value(&agent),
            document_id = %display_value(&document_id),
            "Running AI analysis"
        );

        tokio::time::sleep(self.delay).await;

        let result = AnalysisResult::simulated(document_id, agent);
        info!(task_id = %ctx.task_id, "AI analysis completed");
        Ok(serde_json::to_value(result)?)
    }
}

/// `health_check_task()`
pub struct HealthCheckTask;

#[async_trait]
impl Task for HealthCheckTask {
    fn name(&self) -> TaskName {
        TaskName::HealthCheck
    }

    async fn run(&self, _ctx: &TaskContext, _args: &BoundArgs) -> TaskResult<Value> {
        Ok(json!({
            "status": "healthy",
            "service": "research-platform-worker",
            "message": "Worker is running and ready to process tasks! 🚀",
        }))
    }
}

/// `debug_task()`: bound task, reports its own request context
pub struct DebugTask;

#[async_trait]
impl Task for DebugTask {
    fn name(&self) -> TaskName {
        TaskName::Debug
    }

    async fn run(&self, ctx: &TaskContext, _args: &BoundArgs) -> TaskResult<Value> {
        info!(request = ?ctx, "Debug task request");
        Ok(Value::String("Debug task completed successfully!".to_string()))
    }
}

/// The four standard tasks, with delays taken from worker config
pub fn standard_tasks(config: &WorkerConfig) -> Vec<Box<dyn Task>> {
    vec![
        Box::new(ProcessDocumentTask {
            delay: Duration::from_millis(config.process_document_delay_ms),
        }),
        Box::new(AiAnalysisTask {
            delay: Duration::from_millis(config.ai_analysis_delay_ms),
        }),
        Box::new(HealthCheckTask),
        Box::new(DebugTask),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::bind;
    use research_common::{TaskRecord, TaskStatus};
    use uuid::Uuid;

    fn context(name: TaskName, args: Value, kwargs: Value) -> TaskContext {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            name: name.as_str().to_string(),
            args,
            kwargs,
            status: TaskStatus::Started,
            result: None,
            error: None,
            worker: Some("test".to_string()),
            enqueued_at: chrono::Utc::now(),
            started_at: Some(chrono::Utc::now()),
            finished_at: None,
        };
        TaskContext::from_record(&record, "test")
    }

    async fn invoke(task: &dyn Task, args: Value, kwargs: Value) -> TaskResult<Value> {
        let ctx = context(task.name(), args, kwargs);
        let bound = bind(task.name().as_str(), &task.params(), &ctx.args, &ctx.kwargs)?;
        task.run(&ctx, &bound).await
    }

    #[tokio::test]
    async fn test_process_document_returns_status_string() {
        let task = ProcessDocumentTask { delay: Duration::ZERO };
        let result = invoke(&task, json!([17]), json!({})).await.unwrap();
        assert_eq!(result, json!("Document 17 processed"));

        let result = invoke(&task, json!(["report.pdf"]), json!({})).await.unwrap();
        assert_eq!(result, json!("Document report.pdf processed"));
    }

    #[tokio::test]
    async fn test_ai_analysis_defaults_to_claude() {
        let task = AiAnalysisTask { delay: Duration::ZERO };
        let result = invoke(&task, json!(["doc-9"]), json!({})).await.unwrap();

        assert_eq!(result["document_id"], "doc-9");
        assert_eq!(result["agent"], "claude");
        assert_eq!(result["confidence"], 0.85);
        assert_eq!(result["analysis"], "AI analysis completed by claude");
        assert_eq!(
            result["insights"],
            json!(["Key finding 1", "Key finding 2", "Key finding 3"])
        );
    }

    #[tokio::test]
    async fn test_ai_analysis_with_explicit_agent() {
        let task = AiAnalysisTask { delay: Duration::ZERO };
        let result = invoke(&task, json!([3, "grok"]), json!({})).await.unwrap();
        assert_eq!(result["agent"], "grok");
        assert_eq!(result["document_id"], 3);
    }

    #[tokio::test]
    async fn test_ai_analysis_echoes_non_string_agent() {
        let task = AiAnalysisTask { delay: Duration::ZERO };

        let result = invoke(&task, json!(["doc"]), json!({"agent_type": null}))
            .await
            .unwrap();
        assert_eq!(result["agent"], Value::Null);
        assert_eq!(result["analysis"], "AI analysis completed by null");

        let result = invoke(&task, json!(["doc", 42]), json!({})).await.unwrap();
        assert_eq!(result["agent"], 42);
        assert_eq!(result["analysis"], "AI analysis completed by 42");
    }

    #[tokio::test]
    async fn test_health_check_task_record() {
        let result = invoke(&HealthCheckTask, json!([]), json!({})).await.unwrap();
        assert_eq!(result["status"], "healthy");
        assert_eq!(result["service"], "research-platform-worker");
        assert!(result["message"].is_string());
    }

    #[tokio::test]
    async fn test_debug_task_returns_fixed_string() {
        let result = invoke(&DebugTask, json!([]), json!({})).await.unwrap();
        assert_eq!(result, json!("Debug task completed successfully!"));
    }

    #[tokio::test]
    async fn test_simulated_delay_is_honoured() {
        let task = ProcessDocumentTask {
            delay: Duration::from_millis(50),
        };
        let start = std::time::Instant::now();
        invoke(&task, json!([1]), json!({})).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_standard_tasks_cover_every_name() {
        let tasks = standard_tasks(&WorkerConfig::default());
        for name in TaskName::ALL {
            assert!(tasks.iter().any(|t| t.name() == name), "missing {}", name);
        }
    }
}
