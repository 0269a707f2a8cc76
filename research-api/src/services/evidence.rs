//! Evidence extraction from chat messages

use research_common::db::{ArtifactType, NewArtifact};
use uuid::Uuid;

/// Phrases marking a sentence as evidence (matched case-insensitively)
pub const EVIDENCE_INDICATORS: [&str; 10] = [
    "according to",
    "research shows",
    "studies indicate",
    "data reveals",
    "evidence suggests",
    "findings show",
    "analysis demonstrates",
    "statistics show",
    "survey results",
    "experiment showed",
];

/// Confidence of an automatically extracted evidence artifact
pub const EXTRACTED_CONFIDENCE: f64 = 0.5;

const TITLE_CHARS: usize = 60;

/// Sentences of `text` that contain an evidence indicator, trimmed
pub fn evidence_sentences(text: &str) -> Vec<&str> {
    text.split(". ")
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            EVIDENCE_INDICATORS.iter().any(|marker| lower.contains(marker))
        })
        .map(str::trim)
        .collect()
}

/// Evidence artifacts for every evidence sentence of a message
pub fn extract_evidence(message_id: Uuid, text: &str) -> Vec<NewArtifact> {
    evidence_sentences(text)
        .into_iter()
        .map(|sentence| NewArtifact {
            artifact_type: ArtifactType::Evidence,
            title: sentence.chars().take(TITLE_CHARS).collect(),
            content: sentence.to_string(),
            source_message: Some(message_id),
            confidence_score: Some(EXTRACTED_CONFIDENCE),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_indicator_sentences_are_kept() {
        let text = "Tides are fun. According to NOAA, there are two tides a day. I like boats. \
                    Recent STUDIES INDICATE the moon dominates";
        assert_eq!(
            evidence_sentences(text),
            vec![
                "According to NOAA, there are two tides a day",
                "Recent STUDIES INDICATE the moon dominates"
            ]
        );
    }

    #[test]
    fn test_no_evidence() {
        assert!(evidence_sentences("Just chatting. Nothing to see").is_empty());
        assert!(evidence_sentences("").is_empty());
    }

    #[test]
    fn test_artifact_shape() {
        let id = Uuid::new_v4();
        let long = format!("Research shows {}", "x".repeat(100));
        let artifacts = extract_evidence(id, &long);

        assert_eq!(artifacts.len(), 1);
        let artifact = &artifacts[0];
        assert_eq!(artifact.artifact_type, ArtifactType::Evidence);
        assert_eq!(artifact.title.chars().count(), 60);
        assert_eq!(artifact.content, long);
        assert_eq!(artifact.source_message, Some(id));
        assert_eq!(artifact.confidence_score, Some(0.5));
    }
}
