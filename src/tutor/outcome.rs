//! Per-turn results handed back to the interactive surface

use crate::intent::Intent;
use crate::retrieval::ScoredChunk;
use crate::safety::REJECTION_MESSAGE;

/// A generated answer, quiz or summary
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerPayload {
    pub intent: Intent,
    pub text: String,
    pub grounded: bool,
    pub used_chunks: Vec<ScoredChunk>,
}

/// Input refused before any remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    Disallowed,
    NothingToReExplain,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::EmptyInput => "Empty question.",
            Rejection::Disallowed => REJECTION_MESSAGE,
            Rejection::NothingToReExplain => {
                "I don't have a previous question to re-explain. Ask a specific lesson question."
            }
        }
    }
}

/// Which step of the turn failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Embedding,
    Retrieval,
    Generation,
}

/// A remote or retrieval failure, already rendered for the student
#[derive(Debug, Clone, PartialEq)]
pub struct TurnFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Chunks retrieved before the failure, if any
    pub used_chunks: Vec<ScoredChunk>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answer(AnswerPayload),
    Rejected(Rejection),
    Failed(TurnFailure),
}

impl TurnOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, TurnOutcome::Answer(_))
    }

    pub fn answer(&self) -> Option<&AnswerPayload> {
        match self {
            TurnOutcome::Answer(payload) => Some(payload),
            _ => None,
        }
    }

    /// Short text for the student when there is no answer
    pub fn error_message(&self) -> Option<&str> {
        match self {
            TurnOutcome::Answer(_) => None,
            TurnOutcome::Rejected(rejection) => Some(rejection.message()),
            TurnOutcome::Failed(failure) => Some(&failure.message),
        }
    }
}
