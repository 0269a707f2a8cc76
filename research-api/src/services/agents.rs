//! Simulated AI agents
//!
//! Replies are canned text picked per agent by the kind of question asked;
//! no provider is contacted.

use research_common::db::MessageRole;
use serde::Serialize;
use serde_json::{json, Value};

/// Confidence attached to every simulated reply
pub const REPLY_CONFIDENCE: f64 = 0.85;

/// Processing time reported in reply metadata and agent status
pub const REPLY_PROCESSING_TIME: &str = "1.2s";

/// Availability reported by agent status
pub const AGENT_AVAILABILITY: f64 = 99.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Agent {
    Claude,
    ChatGpt,
    Grok,
}

/// What a user message is mostly about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Research,
    Evidence,
    General,
}

impl Topic {
    fn classify(content: &str) -> Self {
        let lower = content.to_lowercase();
        if lower.contains("research") || lower.contains("study") {
            Topic::Research
        } else if lower.contains("evidence") || lower.contains("data") {
            Topic::Evidence
        } else {
            Topic::General
        }
    }
}

impl Agent {
    pub const ALL: [Agent; 3] = [Agent::Claude, Agent::ChatGpt, Agent::Grok];

    /// Parse an agent name, case-insensitively. `auto` picks Claude.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "claude" | "auto" => Some(Agent::Claude),
            "chatgpt" => Some(Agent::ChatGpt),
            "grok" => Some(Agent::Grok),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.role().as_str()
    }

    /// Message role the agent's replies are stored under
    pub fn role(&self) -> MessageRole {
        match self {
            Agent::Claude => MessageRole::Claude,
            Agent::ChatGpt => MessageRole::ChatGpt,
            Agent::Grok => MessageRole::Grok,
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            Agent::Claude => "Claude-3.5-Sonnet",
            Agent::ChatGpt => "GPT-4",
            Agent::Grok => "Grok-2",
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Agent::Claude => "Anthropic",
            Agent::ChatGpt => "OpenAI",
            Agent::Grok => "xAI",
        }
    }

    pub fn capabilities(&self) -> [&'static str; 4] {
        match self {
            Agent::Claude => ["reasoning", "analysis", "research", "writing"],
            Agent::ChatGpt => ["conversation", "research", "coding", "analysis"],
            Agent::Grok => ["real-time", "analysis", "humor", "research"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Agent::Claude => "Advanced reasoning and analysis",
            Agent::ChatGpt => "Conversational AI and research assistance",
            Agent::Grok => "Real-time information and analysis",
        }
    }

    /// Canned reply to `content`
    pub fn reply(&self, content: &str) -> &'static str {
        match (self, Topic::classify(content)) {
            (Agent::Claude, Topic::Research) => "I'd be happy to help with your research question. Based on current literature, there are several key considerations to explore. Let me break this down systematically and suggest some evidence-based approaches.",
            (Agent::Claude, Topic::Evidence) => "For evidence evaluation, I recommend examining the source credibility, methodology, and potential biases. Would you like me to help analyze specific evidence or suggest research methodologies?",
            (Agent::Claude, Topic::General) => "I understand your question. Let me provide a thoughtful analysis based on available information and research best practices.",
            (Agent::ChatGpt, Topic::Research) => "Great research question! I can help you explore this topic from multiple angles. Let's start by identifying the key variables and potential research methodologies that would be most appropriate.",
            (Agent::ChatGpt, Topic::Evidence) => "When evaluating evidence, it's important to consider the quality of sources, sample sizes, and research design. I can help you assess the strength of different types of evidence.",
            (Agent::ChatGpt, Topic::General) => "That's an interesting question! Let me help you think through this systematically and provide some insights based on current knowledge.",
            (Agent::Grok, Topic::Research) => "Yo! That's a solid research question. Let me dig into the latest data and trends. I've got access to real-time info that might give you some fresh perspectives on this topic.",
            (Agent::Grok, Topic::Evidence) => "Evidence time! I love digging through data. Let me check what's trending and what the latest research is saying about this. Real-time insights coming up!",
            (Agent::Grok, Topic::General) => "Interesting question! Let me tap into the latest information and give you a fresh take on this. I'll keep it real and data-driven.",
        }
    }

    /// Metadata stored with a reply message
    pub fn reply_metadata(&self) -> Value {
        json!({
            "confidence": REPLY_CONFIDENCE,
            "processing_time": REPLY_PROCESSING_TIME,
            "model": self.model(),
        })
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            agent_type: self.as_str(),
            name: self.role().label(),
            provider: self.provider(),
            model: self.model(),
            status: "online",
            capabilities: self.capabilities().to_vec(),
            description: self.description(),
        }
    }
}

/// Catalog entry returned by `GET /api/chat/agents`
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    #[serde(rename = "type")]
    pub agent_type: &'static str,
    pub name: &'static str,
    pub provider: &'static str,
    pub model: &'static str,
    pub status: &'static str,
    pub capabilities: Vec<&'static str>,
    pub description: &'static str,
}

/// Response of `GET /api/chat/agents/{agent}/status`
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    #[serde(rename = "type")]
    pub agent_type: &'static str,
    pub status: &'static str,
    pub response_time: &'static str,
    pub availability: f64,
    pub last_active: chrono::DateTime<chrono::Utc>,
}

impl AgentStatus {
    pub fn online(agent: Agent) -> Self {
        Self {
            agent_type: agent.as_str(),
            status: "online",
            response_time: REPLY_PROCESSING_TIME,
            availability: AGENT_AVAILABILITY,
            last_active: research_common::time::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_auto_means_claude() {
        assert_eq!(Agent::parse("CLAUDE"), Some(Agent::Claude));
        assert_eq!(Agent::parse("auto"), Some(Agent::Claude));
        assert_eq!(Agent::parse("ChatGPT"), Some(Agent::ChatGpt));
        assert_eq!(Agent::parse("grok"), Some(Agent::Grok));
        assert_eq!(Agent::parse("gemini"), None);
    }

    #[test]
    fn test_reply_depends_on_topic() {
        let research = Agent::Claude.reply("Can you help me STUDY tides?");
        let evidence = Agent::Claude.reply("Is there data on this?");
        let general = Agent::Claude.reply("Hello");

        assert!(research.starts_with("I'd be happy to help with your research question"));
        assert!(evidence.starts_with("For evidence evaluation"));
        assert!(general.starts_with("I understand your question"));
    }

    #[test]
    fn test_research_keywords_take_precedence_over_evidence() {
        assert!(Agent::Grok
            .reply("research data")
            .starts_with("Yo! That's a solid research question"));
    }

    #[test]
    fn test_reply_metadata() {
        let metadata = Agent::ChatGpt.reply_metadata();
        assert_eq!(metadata["model"], "GPT-4");
        assert_eq!(metadata["confidence"], 0.85);
        assert_eq!(metadata["processing_time"], "1.2s");
    }

    #[test]
    fn test_catalog_entries() {
        let info = Agent::Grok.info();
        assert_eq!(info.agent_type, "grok");
        assert_eq!(info.name, "Grok");
        assert_eq!(info.provider, "xAI");
        assert_eq!(info.capabilities.len(), 4);
    }
}
