//! Worker loop
//!
//! Polls the broker table, claims PENDING rows one at a time and runs them
//! on the tokio runtime. At most `concurrency` tasks execute at once; a
//! failing or panicking task is recorded as FAILURE and the loop continues.

use research_common::config::WorkerConfig;
use research_common::db::task_queue;
use research_common::{Error, Result, TaskRecord, TaskStatus};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::registry::TaskRegistry;

/// Tasks finished by one `Worker::run`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, status: TaskStatus) {
        let counter = match status {
            TaskStatus::Success => &self.succeeded,
            _ => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> WorkerStats {
        WorkerStats {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct Worker {
    pool: SqlitePool,
    registry: Arc<TaskRegistry>,
    name: String,
    concurrency: usize,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(pool: SqlitePool, registry: TaskRegistry, name: impl Into<String>) -> Self {
        let defaults = WorkerConfig::default();
        Self {
            pool,
            registry: Arc::new(registry),
            name: name.into(),
            concurrency: defaults.concurrency,
            poll_interval: Duration::from_millis(defaults.poll_interval_ms),
        }
    }

    /// Worker running the standard tasks with settings from `config`
    pub fn from_config(pool: SqlitePool, config: &WorkerConfig, name: impl Into<String>) -> Self {
        Self::new(pool, TaskRegistry::standard(config), name)
            .with_concurrency(config.concurrency)
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
    }

    /// Clamped to what both the semaphore and the shutdown drain can count
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, max_concurrency());
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Claim and execute a single task inline.
    ///
    /// Returns the task's final record, or `None` if the queue was empty.
    pub async fn run_once(&self) -> Result<Option<TaskRecord>> {
        let Some(record) = task_queue::claim_next(&self.pool, &self.name).await? else {
            return Ok(None);
        };
        let id = record.id;
        execute(&self.pool, self.registry.clone(), &self.name, record).await?;
        task_queue::get_task(&self.pool, id).await
    }

    /// Run until `shutdown` is cancelled, then wait for in-flight tasks.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<WorkerStats> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let counters = Arc::new(Counters::default());

        info!(
            worker = %self.name,
            concurrency = self.concurrency,
            tasks = ?self.registry.names(),
            "Worker ready"
        );

        loop {
            let permit = tokio::select! {
                _ = shutdown.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| Error::Internal(format!("Worker semaphore closed: {}", e)))?,
            };

            match task_queue::claim_next(&self.pool, &self.name).await {
                Ok(Some(record)) => {
                    let pool = self.pool.clone();
                    let registry = self.registry.clone();
                    let worker = self.name.clone();
                    let counters = counters.clone();

                    tokio::spawn(async move {
                        let task_id = record.id;
                        match execute(&pool, registry, &worker, record).await {
                            Ok(status) => counters.record(status),
                            Err(e) => {
                                error!(task_id = %task_id, error = %e, "Failed to record task outcome");
                                counters.record(TaskStatus::Failure);
                            }
                        }
                        drop(permit);
                    });
                }
                Ok(None) => {
                    drop(permit);
                    if self.idle(&shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    drop(permit);
                    warn!(worker = %self.name, error = %e, "Failed to poll task queue");
                    if self.idle(&shutdown).await {
                        break;
                    }
                }
            }
        }

        info!(worker = %self.name, "Shutdown requested, waiting for running tasks");
        // Every permit back means every spawned task has finished
        let permits = u32::try_from(self.concurrency)
            .map_err(|_| Error::Internal(format!("Concurrency {} out of range", self.concurrency)))?;
        let _all = semaphore
            .acquire_many(permits)
            .await
            .map_err(|e| Error::Internal(format!("Worker semaphore closed: {}", e)))?;

        let stats = counters.snapshot();
        info!(
            worker = %self.name,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Worker stopped"
        );
        Ok(stats)
    }

    /// Sleep one poll interval; true if shutdown arrived meanwhile
    async fn idle(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => true,
            _ = tokio::time::sleep(self.poll_interval) => false,
        }
    }
}

/// Run a claimed task and store its outcome
async fn execute(
    pool: &SqlitePool,
    registry: Arc<TaskRegistry>,
    worker: &str,
    record: TaskRecord,
) -> Result<TaskStatus> {
    let ctx = TaskContext::from_record(&record, worker);
    let started = Instant::now();
    info!(task_id = %record.id, task = %record.name, worker, "Task received");

    // Separate tokio task so a panic is caught as a JoinError
    let handle = tokio::spawn(async move { registry.dispatch(&ctx).await });
    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(TaskError::Panicked(panic_message(join_error))),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(value) => match task_queue::mark_success(pool, record.id, &value).await {
            Ok(()) => {
                info!(task_id = %record.id, task = %record.name, elapsed_ms, "Task succeeded");
                debug!(task_id = %record.id, result = %value, "Task result");
                Ok(TaskStatus::Success)
            }
            Err(e) => {
                // The row must still leave STARTED
                error!(task_id = %record.id, error = %e, "Failed to store task result");
                let message = format!("Failed to store task result: {}", e);
                task_queue::mark_failure(pool, record.id, &message).await?;
                Ok(TaskStatus::Failure)
            }
        },
        Err(e) => {
            let message = e.to_string();
            task_queue::mark_failure(pool, record.id, &message).await?;
            warn!(
                task_id = %record.id,
                task = %record.name,
                elapsed_ms,
                error = %message,
                "Task failed"
            );
            Ok(TaskStatus::Failure)
        }
    }
}

/// Largest pool size the semaphore accepts and `acquire_many` can drain
pub fn max_concurrency() -> usize {
    Semaphore::MAX_PERMITS.min(u32::MAX as usize)
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    if !join_error.is_panic() {
        return join_error.to_string();
    }
    let payload = join_error.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
