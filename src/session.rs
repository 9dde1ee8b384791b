//! Conversation state for follow-up requests
//!
//! Owned by the caller and threaded through each turn. Only a successful
//! answer replaces it; nothing is persisted.

use crate::retrieval::ScoredChunk;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub last_question: Option<String>,
    pub last_answer: Option<String>,
    pub last_chunks: Option<Vec<ScoredChunk>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State after a successful answer
    pub fn answered(question: String, answer: String, chunks: Vec<ScoredChunk>) -> Self {
        Self {
            last_question: Some(question),
            last_answer: Some(answer),
            last_chunks: Some(chunks),
        }
    }

    pub fn has_history(&self) -> bool {
        self.last_question.is_some()
    }

    /// Chunks of the last answer, if it used any
    pub fn reusable_chunks(&self) -> Option<&[ScoredChunk]> {
        self.last_chunks
            .as_deref()
            .filter(|chunks| !chunks.is_empty())
    }
}
