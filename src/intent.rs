//! Follow-up intent detection
//!
//! Keyword phrases, checked in priority order:
//! re-explain, then quiz, then summary. Anything else is a normal question.

use serde::{Deserialize, Serialize};

const REEXPLAIN_PHRASES: &[&str] = &[
    "i don't understand",
    "i dont understand",
    "explain again",
    "can you explain",
    "simplify",
    "simpler",
    "rephrase",
    "another way",
    "dont understand",
    "i need help",
    "i'm lost",
    "i am lost",
];

const QUIZ_PHRASES: &[&str] = &["quiz", "test me", "ask me questions"];

const SUMMARY_PHRASES: &[&str] = &["summary", "summarize"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Normal,
    ReExplain,
    Quiz,
    Summary,
}

/// Stateless phrase matcher
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Intent {
        let lower = text.to_lowercase();
        let matches = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

        if matches(REEXPLAIN_PHRASES) {
            Intent::ReExplain
        } else if matches(QUIZ_PHRASES) {
            Intent::Quiz
        } else if matches(SUMMARY_PHRASES) {
            Intent::Summary
        } else {
            Intent::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_intent() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("What is photosynthesis?"), Intent::Normal);
        assert_eq!(c.classify("I don't understand"), Intent::ReExplain);
        assert_eq!(c.classify("Quiz me please"), Intent::Quiz);
        assert_eq!(c.classify("Give me a SUMMARY"), Intent::Summary);
    }

    #[test]
    fn test_priority_order() {
        let c = IntentClassifier::new();
        assert_eq!(c.classify("simpler quiz please"), Intent::ReExplain);
        assert_eq!(c.classify("quiz me on the summary"), Intent::Quiz);
    }

    #[test]
    fn test_empty_is_normal() {
        assert_eq!(IntentClassifier::new().classify(""), Intent::Normal);
    }
}
