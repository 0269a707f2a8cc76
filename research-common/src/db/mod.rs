//! Database models and queries

pub mod artifacts;
pub mod evidence;
pub mod init;
pub mod messages;
pub mod models;
pub mod retry;
pub mod sessions;
pub mod statements;
pub mod task_queue;

pub use init::*;
pub use models::*;
