//! Error types for research-worker
//!
//! A `TaskError` fails one task (recorded as FAILURE on its broker row); it
//! never stops the worker loop.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Task name not registered with this worker
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("{task}() missing required argument: '{name}'")]
    MissingArgument { task: String, name: String },

    #[error("{task}() got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { task: String, name: String },

    #[error("{task}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        task: String,
        expected: usize,
        given: usize,
    },

    #[error("{task}() got multiple values for argument '{name}'")]
    DuplicateArgument { task: String, name: String },

    /// args/kwargs not shaped as array/object
    #[error("Malformed task payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The task body panicked
    #[error("Task panicked: {0}")]
    Panicked(String),
}

pub type TaskResult<T> = Result<T, TaskError>;
