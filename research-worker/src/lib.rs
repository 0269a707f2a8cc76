//! research-worker: background task execution
//!
//! Claims tasks from the shared `task_queue` table, runs them and stores
//! each outcome back into the row for the API to report.

pub mod args;
pub mod context;
pub mod error;
pub mod registry;
pub mod tasks;
pub mod worker;

pub use context::TaskContext;
pub use error::{TaskError, TaskResult};
pub use registry::TaskRegistry;
pub use tasks::Task;
pub use worker::{Worker, WorkerStats};
