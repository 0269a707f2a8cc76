//! Domain services behind the HTTP handlers

pub mod agents;
pub mod evidence;
pub mod insights;
pub mod subquestions;

pub use agents::{Agent, AgentInfo, AgentStatus};
pub use evidence::{evidence_sentences, extract_evidence};
pub use insights::SessionInsights;
pub use subquestions::generate_subquestions;
