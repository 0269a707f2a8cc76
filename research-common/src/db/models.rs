//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

pub const DEFAULT_SESSION_TITLE: &str = "New Research Session";
pub const DEFAULT_METHODOLOGY: &str = "inquiry_cycle";
pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_METHODOLOGY_LEN: usize = 50;

/// A research session groups a conversation and the artifacts drawn from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSession {
    pub id: Uuid,
    pub title: String,
    pub research_question: Option<String>,
    pub methodology: String,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Fields accepted when creating a session; absent fields take defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSession {
    pub title: Option<String>,
    pub research_question: Option<String>,
    pub methodology: Option<String>,
    pub created_by: Option<String>,
}

/// Partial update of a session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionUpdate {
    pub title: Option<String>,
    pub research_question: Option<String>,
    pub methodology: Option<String>,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Claude,
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Grok,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Claude => "claude",
            MessageRole::ChatGpt => "chatgpt",
            MessageRole::Grok => "grok",
            MessageRole::System => "system",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Claude => "Claude",
            MessageRole::ChatGpt => "ChatGPT",
            MessageRole::Grok => "Grok",
            MessageRole::System => "System",
        }
    }

    /// True for the AI agent roles
    pub fn is_agent(&self) -> bool {
        matches!(
            self,
            MessageRole::Claude | MessageRole::ChatGpt | MessageRole::Grok
        )
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(MessageRole::User),
            "claude" => Ok(MessageRole::Claude),
            "chatgpt" => Ok(MessageRole::ChatGpt),
            "grok" => Ok(MessageRole::Grok),
            "system" => Ok(MessageRole::System),
            other => Err(Error::InvalidInput(format!("Unknown message role: {}", other))),
        }
    }
}

/// One message of a session's conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form key/value data (AI response metadata)
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl NewMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput("Message content must not be empty".to_string()));
        }
        if let Some(metadata) = &self.metadata {
            if !metadata.is_object() {
                return Err(Error::InvalidInput("Message metadata must be a JSON object".to_string()));
            }
        }
        Ok(())
    }
}

/// Kind of research artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    ResearchStatement,
    Claim,
    Evidence,
    Hypothesis,
    Question,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::ResearchStatement => "research_statement",
            ArtifactType::Claim => "claim",
            ArtifactType::Evidence => "evidence",
            ArtifactType::Hypothesis => "hypothesis",
            ArtifactType::Question => "question",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "research_statement" => Ok(ArtifactType::ResearchStatement),
            "claim" => Ok(ArtifactType::Claim),
            "evidence" => Ok(ArtifactType::Evidence),
            "hypothesis" => Ok(ArtifactType::Hypothesis),
            "question" => Ok(ArtifactType::Question),
            other => Err(Error::InvalidInput(format!("Unknown artifact type: {}", other))),
        }
    }
}

/// A research artifact (claim, evidence, hypothesis, ...) drawn from chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub session_id: Uuid,
    pub artifact_type: ArtifactType,
    pub title: String,
    pub content: String,
    /// Message the artifact was extracted from; nulled if that message is deleted
    pub source_message: Option<Uuid>,
    /// AI confidence in the extraction (0.0 - 1.0)
    pub confidence_score: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArtifact {
    pub artifact_type: ArtifactType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source_message: Option<Uuid>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

impl NewArtifact {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput("Artifact content must not be empty".to_string()));
        }
        if let Some(score) = self.confidence_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "confidence_score must be within 0.0..=1.0, got {}",
                    score
                )));
            }
        }
        Ok(())
    }
}

/// Titles are required and capped at 255 characters
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::InvalidInput(format!(
            "Title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

pub fn validate_methodology(methodology: &str) -> Result<()> {
    if methodology.trim().is_empty() || methodology.chars().count() > MAX_METHODOLOGY_LEN {
        return Err(Error::InvalidInput(format!(
            "Methodology must be 1-{} characters",
            MAX_METHODOLOGY_LEN
        )));
    }
    Ok(())
}

/// Length caps of research statement text
pub const MAX_STATEMENT_LEN: usize = 1000;
pub const MAX_REFINEMENT_NOTES_LEN: usize = 2000;
pub const MAX_SUBQUESTION_LEN: usize = 500;

/// Kind of research statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum StatementType {
    Exploratory,
    Specific,
    Hypothesis,
    ResearchQuestion,
}

impl StatementType {
    pub const ALL: [StatementType; 4] = [
        StatementType::Exploratory,
        StatementType::Specific,
        StatementType::Hypothesis,
        StatementType::ResearchQuestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementType::Exploratory => "EXPLORATORY",
            StatementType::Specific => "SPECIFIC",
            StatementType::Hypothesis => "HYPOTHESIS",
            StatementType::ResearchQuestion => "RESEARCH_QUESTION",
        }
    }
}

/// Workflow state of a research statement
///
/// Any state may follow any other; refinement always lands in `Refined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum StatementStatus {
    Draft,
    Active,
    Refined,
    Completed,
    Archived,
}

impl StatementStatus {
    pub const ALL: [StatementStatus; 5] = [
        StatementStatus::Draft,
        StatementStatus::Active,
        StatementStatus::Refined,
        StatementStatus::Completed,
        StatementStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementStatus::Draft => "DRAFT",
            StatementStatus::Active => "ACTIVE",
            StatementStatus::Refined => "REFINED",
            StatementStatus::Completed => "COMPLETED",
            StatementStatus::Archived => "ARCHIVED",
        }
    }
}

/// A research statement and its refinement history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchStatement {
    pub id: Uuid,
    pub session_id: Uuid,
    pub original_statement: String,
    pub refined_statement: Option<String>,
    pub statement_type: StatementType,
    pub status: StatementStatus,
    pub subquestions: Vec<String>,
    pub refinement_notes: Option<String>,
    pub refinement_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_refined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStatement {
    pub session_id: Uuid,
    pub original_statement: String,
    /// Defaults to `EXPLORATORY`
    #[serde(default)]
    pub statement_type: Option<StatementType>,
}

impl NewStatement {
    pub fn validate(&self) -> Result<()> {
        validate_text("original_statement", &self.original_statement, MAX_STATEMENT_LEN)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatementRefinement {
    pub refined_statement: String,
    #[serde(default)]
    pub refinement_notes: Option<String>,
}

impl StatementRefinement {
    pub fn validate(&self) -> Result<()> {
        validate_text("refined_statement", &self.refined_statement, MAX_STATEMENT_LEN)?;
        if let Some(notes) = &self.refinement_notes {
            if notes.chars().count() > MAX_REFINEMENT_NOTES_LEN {
                return Err(Error::InvalidInput(format!(
                    "refinement_notes exceeds {} characters",
                    MAX_REFINEMENT_NOTES_LEN
                )));
            }
        }
        Ok(())
    }
}

/// Per-session counts of research statements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementStatistics {
    pub total_statements: i64,
    pub exploratory_count: i64,
    pub specific_count: i64,
    pub hypothesis_count: i64,
    pub research_question_count: i64,
    pub active_count: i64,
    pub refined_count: i64,
}

/// Provenance tier of an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum EvidenceType {
    Primary,
    Secondary,
    Tertiary,
}

impl EvidenceType {
    pub const ALL: [EvidenceType; 3] = [
        EvidenceType::Primary,
        EvidenceType::Secondary,
        EvidenceType::Tertiary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Primary => "PRIMARY",
            EvidenceType::Secondary => "SECONDARY",
            EvidenceType::Tertiary => "TERTIARY",
        }
    }

    fn base_reliability(&self) -> f64 {
        match self {
            EvidenceType::Primary => 0.8,
            EvidenceType::Secondary => 0.6,
            EvidenceType::Tertiary => 0.4,
        }
    }
}

/// Reliability of new evidence from its tier and the wording of its source
pub fn initial_reliability(evidence_type: EvidenceType, source: &str) -> f64 {
    let source = source.to_lowercase();
    let adjustment = if source.contains("peer-reviewed") || source.contains("journal") {
        0.15
    } else if source.contains("government") || source.contains("official") {
        0.1
    } else if source.contains("news") || source.contains("media") {
        0.05
    } else if source.contains("blog") || source.contains("opinion") {
        -0.1
    } else {
        0.0
    };
    (evidence_type.base_reliability() + adjustment).clamp(0.0, 1.0)
}

/// How an evidence item bears on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum LinkType {
    Supports,
    Contradicts,
    Neutral,
    Partial,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Supports => "SUPPORTS",
            LinkType::Contradicts => "CONTRADICTS",
            LinkType::Neutral => "NEUTRAL",
            LinkType::Partial => "PARTIAL",
        }
    }

    /// Link strength for evidence of the given reliability
    pub fn strength(&self, reliability: f64) -> f64 {
        let factor = match self {
            LinkType::Supports => 1.0,
            LinkType::Contradicts => 0.9,
            LinkType::Partial => 0.7,
            LinkType::Neutral => 0.5,
        };
        reliability * factor
    }
}

/// Link from an evidence item to the research statement it bears on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimLink {
    pub claim_id: Uuid,
    pub link_type: LinkType,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

/// A curated evidence item of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub session_id: Uuid,
    pub content: String,
    pub evidence_type: EvidenceType,
    pub source: String,
    /// 0.0 - 1.0
    pub reliability_score: f64,
    pub reliability_reason: Option<String>,
    pub tags: Vec<String>,
    pub linked_claims: Vec<ClaimLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvidence {
    pub session_id: Uuid,
    pub content: String,
    pub evidence_type: EvidenceType,
    #[serde(default)]
    pub source: String,
}

impl NewEvidence {
    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(Error::InvalidInput("Evidence content must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Per-session evidence counts and mean reliability
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvidenceStatistics {
    pub total_evidence: i64,
    pub primary_count: i64,
    pub secondary_count: i64,
    pub tertiary_count: i64,
    /// 0.0 when the session has no evidence
    pub average_reliability: f64,
    pub linked_count: i64,
}

/// Case-insensitive `FromStr`, plus `TryFrom<String>` for serde
macro_rules! upper_case_enum {
    ($ty:ident, $what:literal, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let upper = s.trim().to_ascii_uppercase();
                $(
                    if upper == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(Error::InvalidInput(format!(concat!("Unknown ", $what, ": {}"), s)))
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }
    };
}

upper_case_enum!(StatementType, "statement type", [Exploratory, Specific, Hypothesis, ResearchQuestion]);
upper_case_enum!(StatementStatus, "statement status", [Draft, Active, Refined, Completed, Archived]);
upper_case_enum!(EvidenceType, "evidence type", [Primary, Secondary, Tertiary]);
upper_case_enum!(LinkType, "link type", [Supports, Contradicts, Neutral, Partial]);

/// Required text with a length cap
pub fn validate_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(Error::InvalidInput(format!(
            "{} exceeds {} characters",
            field, max_len
        )));
    }
    Ok(())
}
