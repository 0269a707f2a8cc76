//! HTTP API handlers

pub mod artifacts;
pub mod chat;
pub mod evidence;
pub mod health;
pub mod info;
pub mod messages;
pub mod sessions;
pub mod statements;
pub mod tasks;

pub use artifacts::artifact_routes;
pub use chat::chat_routes;
pub use evidence::evidence_routes;
pub use health::health_routes;
pub use info::info_routes;
pub use messages::message_routes;
pub use sessions::session_routes;
pub use statements::statement_routes;
pub use tasks::task_routes;
