//! Conversation insights

use chrono::{DateTime, Utc};
use research_common::db::ChatMessage;
use serde::Serialize;
use std::collections::BTreeMap;

/// Research keywords reported as key topics, in report order
pub const RESEARCH_KEYWORDS: [&str; 12] = [
    "research",
    "study",
    "analysis",
    "evidence",
    "data",
    "methodology",
    "hypothesis",
    "theory",
    "findings",
    "results",
    "conclusion",
    "literature",
];

const MAX_TOPICS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct SessionInsights {
    pub total_messages: usize,
    pub user_messages: usize,
    pub agent_messages: usize,
    /// Replies per agent role
    pub agent_usage: BTreeMap<String, usize>,
    pub key_topics: Vec<&'static str>,
    pub generated_at: DateTime<Utc>,
}

impl SessionInsights {
    pub fn from_messages(messages: &[ChatMessage]) -> Self {
        let mut agent_usage = BTreeMap::new();
        let mut user_messages = 0;
        for message in messages {
            if message.role.is_agent() {
                *agent_usage.entry(message.role.as_str().to_string()).or_insert(0) += 1;
            } else if message.role == research_common::db::MessageRole::User {
                user_messages += 1;
            }
        }

        Self {
            total_messages: messages.len(),
            user_messages,
            agent_messages: agent_usage.values().sum(),
            agent_usage,
            key_topics: key_topics(messages.iter().map(|m| m.content.as_str())),
            generated_at: research_common::time::now(),
        }
    }
}

/// Research keywords occurring anywhere in `contents`
pub fn key_topics<'a>(contents: impl Iterator<Item = &'a str>) -> Vec<&'static str> {
    let text = contents
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");

    RESEARCH_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| text.contains(keyword))
        .take(MAX_TOPICS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_common::db::MessageRole;
    use uuid::Uuid;

    fn message(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::nil(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_counts_and_usage() {
        let messages = vec![
            message(MessageRole::User, "What does the data say?"),
            message(MessageRole::Claude, "Let me look"),
            message(MessageRole::User, "And the theory?"),
            message(MessageRole::Grok, "Sure"),
            message(MessageRole::Claude, "Here"),
            message(MessageRole::System, "Session started"),
        ];

        let insights = SessionInsights::from_messages(&messages);

        assert_eq!(insights.total_messages, 6);
        assert_eq!(insights.user_messages, 2);
        assert_eq!(insights.agent_messages, 3);
        assert_eq!(insights.agent_usage.get("claude"), Some(&2));
        assert_eq!(insights.agent_usage.get("grok"), Some(&1));
        assert_eq!(insights.key_topics, vec!["data", "theory"]);
    }

    #[test]
    fn test_topics_follow_keyword_order_and_cap() {
        let all = RESEARCH_KEYWORDS.iter().rev().copied().collect::<Vec<_>>().join(" ");
        let topics = key_topics(std::iter::once(all.as_str()));
        assert_eq!(topics.len(), 10);
        assert_eq!(topics[0], "research");
        assert_eq!(topics[9], "results");
    }

    #[test]
    fn test_empty_session() {
        let insights = SessionInsights::from_messages(&[]);
        assert_eq!(insights.total_messages, 0);
        assert!(insights.agent_usage.is_empty());
        assert!(insights.key_topics.is_empty());
    }
}
