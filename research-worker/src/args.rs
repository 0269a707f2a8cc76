//! Argument binding
//!
//! Tasks are invoked with positional `args` (JSON array) and keyword
//! `kwargs` (JSON object). Positionals bind to parameters in declaration
//! order, keywords fill the rest, and defaults cover what is left.

use serde_json::Value;
use std::collections::HashMap;

use crate::error::{TaskError, TaskResult};

/// One declared task parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: &'static str,
    pub default: Option<Value>,
}

impl Param {
    pub fn required(name: &'static str) -> Self {
        Self { name, default: None }
    }

    pub fn optional(name: &'static str, default: Value) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }
}

/// Arguments resolved against a task's parameter list
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    values: HashMap<&'static str, Value>,
}

impl BoundArgs {
    /// Value of a declared parameter (`Value::Null` if undeclared)
    pub fn get(&self, name: &str) -> &Value {
        self.values.get(name).unwrap_or(&Value::Null)
    }
}

/// Bind `args`/`kwargs` to `params` for task `task`
pub fn bind(task: &str, params: &[Param], args: &Value, kwargs: &Value) -> TaskResult<BoundArgs> {
    let positional = match args {
        Value::Array(items) => items.as_slice(),
        Value::Null => &[],
        other => {
            return Err(TaskError::MalformedPayload(format!(
                "args must be an array, got {}",
                other
            )))
        }
    };
    let empty = serde_json::Map::new();
    let keywords = match kwargs {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(TaskError::MalformedPayload(format!(
                "kwargs must be an object, got {}",
                other
            )))
        }
    };

    if positional.len() > params.len() {
        return Err(TaskError::TooManyArguments {
            task: task.to_string(),
            expected: params.len(),
            given: positional.len(),
        });
    }

    if let Some(unknown) = keywords
        .keys()
        .find(|key| !params.iter().any(|p| p.name == key.as_str()))
    {
        return Err(TaskError::UnexpectedKeyword {
            task: task.to_string(),
            name: unknown.clone(),
        });
    }

    let mut values = HashMap::with_capacity(params.len());
    for (index, param) in params.iter().enumerate() {
        let from_position = positional.get(index);
        let from_keyword = keywords.get(param.name);

        let value = match (from_position, from_keyword) {
            (Some(_), Some(_)) => {
                return Err(TaskError::DuplicateArgument {
                    task: task.to_string(),
                    name: param.name.to_string(),
                })
            }
            (Some(v), None) | (None, Some(v)) => v.clone(),
            (None, None) => match &param.default {
                Some(default) => default.clone(),
                None => {
                    return Err(TaskError::MissingArgument {
                        task: task.to_string(),
                        name: param.name.to_string(),
                    })
                }
            },
        };
        values.insert(param.name, value);
    }

    Ok(BoundArgs { values })
}
