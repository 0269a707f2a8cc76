//! # Research Platform Common Library
//!
//! Shared code for the research platform services:
//! - Database initialization, models and queries
//! - Task queue envelope types (broker rows shared by API and worker)
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod db;
pub mod error;
pub mod tasks;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use tasks::{TaskName, TaskRecord, TaskStatus};
