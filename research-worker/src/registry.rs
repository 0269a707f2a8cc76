//! Task registry: maps queue names to task implementations

use research_common::config::WorkerConfig;
use research_common::TaskName;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::args::bind;
use crate::context::TaskContext;
use crate::error::{TaskError, TaskResult};
use crate::tasks::{standard_tasks, Task};

#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, Box<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the four standard tasks
    pub fn standard(config: &WorkerConfig) -> Self {
        let mut registry = Self::new();
        for task in standard_tasks(config) {
            registry.register(task);
        }
        registry
    }

    /// Register a task, replacing any previous one with the same name
    pub fn register(&mut self, task: Box<dyn Task>) {
        self.tasks.insert(task.name(), task);
    }

    pub fn contains(&self, name: TaskName) -> bool {
        self.tasks.contains_key(&name)
    }

    /// Registered task names, in declaration order
    pub fn names(&self) -> Vec<TaskName> {
        TaskName::ALL
            .into_iter()
            .filter(|name| self.contains(*name))
            .collect()
    }

    /// Resolve the task named in `ctx`, bind its arguments and run it
    pub async fn dispatch(&self, ctx: &TaskContext) -> TaskResult<Value> {
        let task = ctx
            .name
            .parse::<TaskName>()
            .ok()
            .and_then(|name| self.tasks.get(&name))
            .ok_or_else(|| TaskError::UnknownTask(ctx.name.clone()))?;

        let args = bind(&ctx.name, &task.params(), &ctx.args, &ctx.kwargs)?;
        debug!(task_id = %ctx.task_id, task = %ctx.name, "Dispatching task");
        task.run(ctx, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_common::{TaskRecord, TaskStatus};
    use serde_json::json;
    use uuid::Uuid;

    fn context(name: &str, args: Value) -> TaskContext {
        let record = TaskRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            args,
            kwargs: json!({}),
            status: TaskStatus::Started,
            result: None,
            error: None,
            worker: None,
            enqueued_at: chrono::Utc::now(),
            started_at: None,
            finished_at: None,
        };
        TaskContext::from_record(&record, "registry-test")
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            process_document_delay_ms: 0,
            ai_analysis_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_registry_names() {
        let registry = TaskRegistry::standard(&fast_config());
        assert_eq!(registry.names(), TaskName::ALL.to_vec());
        assert!(TaskRegistry::new().names().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_runs_task() {
        let registry = TaskRegistry::standard(&fast_config());
        let result = registry
            .dispatch(&context("process_document", json!(["abc"])))
            .await
            .unwrap();
        assert_eq!(result, json!("Document abc processed"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_name() {
        let registry = TaskRegistry::standard(&fast_config());
        let err = registry
            .dispatch(&context("send_email", json!([])))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown task: send_email");
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_known_name() {
        let registry = TaskRegistry::new();
        let err = registry
            .dispatch(&context("debug_task", json!([])))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn test_dispatch_binding_failure() {
        let registry = TaskRegistry::standard(&fast_config());
        let err = registry
            .dispatch(&context("process_document", json!([])))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::MissingArgument { .. }));
    }
}
