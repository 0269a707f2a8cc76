//! Subquestion suggestions for a research statement
//!
//! Keyword driven: impact/effect statements get consequence questions,
//! relationship/correlation statements get causality questions, anything
//! else gets a general research plan.

/// Leading words of a statement used as its topic
const TOPIC_WORDS: usize = 4;

/// The leading words of a statement, or the whole statement when short
fn main_topic(statement: &str) -> String {
    let words: Vec<&str> = statement.split(' ').collect();
    if words.len() >= TOPIC_WORDS {
        words[..TOPIC_WORDS].join(" ")
    } else {
        statement.to_string()
    }
}

/// Suggested subquestions for `statement`
pub fn generate_subquestions(statement: &str) -> Vec<String> {
    let lower = statement.to_lowercase();
    let topic = main_topic(statement);

    if lower.contains("impact") || lower.contains("effect") {
        vec![
            format!("What are the direct effects of {}?", topic),
            "What are the indirect consequences?".to_string(),
            "How can these impacts be measured?".to_string(),
            "What factors influence the magnitude of impact?".to_string(),
        ]
    } else if lower.contains("relationship") || lower.contains("correlation") {
        vec![
            "What is the nature of this relationship?".to_string(),
            "Is this relationship causal or correlational?".to_string(),
            "What variables might mediate this relationship?".to_string(),
            "How strong is this relationship?".to_string(),
        ]
    } else {
        vec![
            format!("What are the key components of {}?", topic),
            "What existing research addresses this topic?".to_string(),
            "What methodologies are most appropriate for investigating this?".to_string(),
            "What are the potential limitations of this research?".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_statements_ask_about_consequences() {
        let questions = generate_subquestions("The Impact of remote work on productivity");
        assert_eq!(questions.len(), 4);
        assert_eq!(questions[0], "What are the direct effects of The Impact of remote?");
        assert_eq!(questions[2], "How can these impacts be measured?");
    }

    #[test]
    fn test_impact_wins_over_relationship() {
        let questions = generate_subquestions("effect and relationship");
        assert_eq!(questions[0], "What are the direct effects of effect and relationship?");
    }

    #[test]
    fn test_relationship_statements_ask_about_causality() {
        let questions = generate_subquestions("Correlation between sleep and grades");
        assert_eq!(questions[1], "Is this relationship causal or correlational?");
        assert!(questions.iter().all(|q| !q.contains("Correlation between")));
    }

    #[test]
    fn test_other_statements_get_general_plan() {
        let questions = generate_subquestions("Ocean tides");
        assert_eq!(questions[0], "What are the key components of Ocean tides?");
        assert_eq!(questions[3], "What are the potential limitations of this research?");
    }

    #[test]
    fn test_topic_uses_first_four_words_of_longer_statements() {
        assert_eq!(main_topic("one two three"), "one two three");
        assert_eq!(main_topic("one two three four five"), "one two three four");
    }
}
