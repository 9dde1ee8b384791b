//! Tutor orchestrator
//!
//! One call to [`Tutor::turn`] handles one line of student input:
//!
//! 1. Reject empty input
//! 2. Reject disallowed input (no remote calls are made)
//! 3. Branch on intent: re-explain, quiz, summary or a normal question
//! 4. Convert remote failures into [`TurnOutcome::Failed`]
//! 5. On a successful answer, return the updated [`SessionState`]

pub mod outcome;

use std::sync::Arc;
use tracing::{debug, info, warn};

pub use outcome::{AnswerPayload, FailureKind, Rejection, TurnFailure, TurnOutcome};

use crate::config::{Config, RetrievalConfig};
use crate::errors::TutorError;
use crate::intent::{Intent, IntentClassifier};
use crate::prompt::PromptBuilder;
use crate::retrieval::{is_grounded, RetrievalResult, Retriever, ScoredChunk};
use crate::retry::RetryExecutor;
use crate::safety::SafetyFilter;
use crate::service::{EmbeddingService, GenerationService, TaskType};
use crate::session::SessionState;

/// Composes retrieval, prompting and generation into tutoring turns
pub struct Tutor {
    retriever: Retriever,
    embedder: Arc<dyn EmbeddingService>,
    generator: Arc<dyn GenerationService>,
    prompts: PromptBuilder,
    retry: RetryExecutor,
    safety: SafetyFilter,
    classifier: IntentClassifier,
    top_k: usize,
    query_task: TaskType,
}

impl Tutor {
    /// Create a tutor with default retry, safety and retrieval settings
    pub fn new(
        retriever: Retriever,
        embedder: Arc<dyn EmbeddingService>,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            retriever,
            embedder,
            generator,
            prompts: PromptBuilder::new(),
            retry: RetryExecutor::default(),
            safety: SafetyFilter::new(),
            classifier: IntentClassifier::new(),
            top_k: defaults.top_k,
            query_task: defaults.query_task_type,
        }
    }

    /// Create a tutor with settings taken from `config`
    pub fn from_config(
        config: &Config,
        retriever: Retriever,
        embedder: Arc<dyn EmbeddingService>,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        Self::new(retriever, embedder, generator)
            .with_retry(RetryExecutor::from_config(&config.retry))
            .with_safety(SafetyFilter::with_extra_keywords(&config.safety.extra_keywords))
            .with_top_k(config.retrieval.top_k)
            .with_query_task(config.retrieval.query_task_type)
    }

    pub fn with_retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_safety(mut self, safety: SafetyFilter) -> Self {
        self.safety = safety;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_query_task(mut self, task: TaskType) -> Self {
        self.query_task = task;
        self
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Handle one line of input. The returned session replaces the one passed in.
    pub async fn turn(&self, session: SessionState, input: &str) -> (SessionState, TurnOutcome) {
        let text = input.trim();
        if text.is_empty() {
            return (session, TurnOutcome::Rejected(Rejection::EmptyInput));
        }

        if self.safety.is_disallowed(text) {
            info!("Input rejected by safety filter");
            return (session, TurnOutcome::Rejected(Rejection::Disallowed));
        }

        let intent = self.classifier.classify(text);
        debug!(?intent, "Intent classified");

        match intent {
            Intent::ReExplain => match session.last_question.clone() {
                Some(question) => self.answer(session, &question, true).await,
                None => (session, TurnOutcome::Rejected(Rejection::NothingToReExplain)),
            },
            Intent::Quiz | Intent::Summary => {
                let outcome = self.follow_up(&session, text, intent).await;
                (session, outcome)
            }
            Intent::Normal => self.answer(session, text, false).await,
        }
    }

    /// Normal pipeline: embed, retrieve, render, generate
    async fn answer(
        &self,
        session: SessionState,
        question: &str,
        reexplain: bool,
    ) -> (SessionState, TurnOutcome) {
        let retrieval = match self.retrieve(question).await {
            Ok(retrieval) => retrieval,
            Err(failure) => return (session, TurnOutcome::Failed(failure)),
        };

        let RetrievalResult { chunks, grounded } = retrieval;
        let prompt = self.prompts.build(&chunks, question, grounded, reexplain);

        match self.generate(&prompt).await {
            Ok(text) => {
                info!(grounded, chunks = chunks.len(), reexplain, "Answer generated");
                let payload = AnswerPayload {
                    intent: if reexplain { Intent::ReExplain } else { Intent::Normal },
                    text: text.clone(),
                    grounded,
                    used_chunks: chunks.clone(),
                };
                let next = SessionState::answered(question.to_string(), text, chunks);
                (next, TurnOutcome::Answer(payload))
            }
            Err(e) => (
                session,
                TurnOutcome::Failed(TurnFailure {
                    kind: FailureKind::Generation,
                    message: TutorError::GenerationFailure(e).to_string(),
                    used_chunks: chunks,
                }),
            ),
        }
    }

    /// Quiz or summary over the last answer's chunks, or fresh ones
    async fn follow_up(&self, session: &SessionState, text: &str, intent: Intent) -> TurnOutcome {
        let chunks: Vec<ScoredChunk> = match session.reusable_chunks() {
            Some(chunks) => chunks.to_vec(),
            None => match self.retrieve(text).await {
                Ok(retrieval) => retrieval.chunks,
                Err(failure) => {
                    warn!(
                        error = %failure.message,
                        "Retrieval for follow-up failed; using empty context"
                    );
                    Vec::new()
                }
            },
        };

        let (prompt, label) = match intent {
            Intent::Quiz => (self.prompts.build_quiz(&chunks), "Quiz"),
            _ => (self.prompts.build_summary(&chunks, text), "Summary"),
        };

        match self.generate(&prompt).await {
            Ok(answer) => {
                info!(?intent, chunks = chunks.len(), "Follow-up generated");
                TurnOutcome::Answer(AnswerPayload {
                    intent,
                    text: answer,
                    grounded: is_grounded(&chunks, self.retriever.threshold()),
                    used_chunks: chunks,
                })
            }
            Err(e) => TurnOutcome::Failed(TurnFailure {
                kind: FailureKind::Generation,
                message: format!("{} generation failed: {}", label, e),
                used_chunks: chunks,
            }),
        }
    }

    async fn retrieve(&self, text: &str) -> Result<RetrievalResult, TurnFailure> {
        let texts = [text.to_string()];
        let embedded = self
            .retry
            .execute(|| self.embedder.embed(&texts, self.query_task))
            .await;

        let query = match embedded.map(|mut vectors| vectors.pop()) {
            Ok(Some(vector)) => vector,
            Ok(None) => {
                return Err(embedding_failure(TutorError::EmbeddingFailure(
                    crate::errors::ServiceError::malformed("no embedding returned"),
                )))
            }
            Err(e) => return Err(embedding_failure(TutorError::EmbeddingFailure(e))),
        };

        self.retriever
            .search(&query, self.top_k)
            .map_err(|e| TurnFailure {
                kind: FailureKind::Retrieval,
                message: format!("Retrieval failed: {}", e),
                used_chunks: Vec::new(),
            })
    }

    async fn generate(&self, prompt: &str) -> Result<String, crate::errors::ServiceError> {
        self.retry.execute(|| self.generator.generate(prompt)).await
    }
}

fn embedding_failure(error: TutorError) -> TurnFailure {
    TurnFailure {
        kind: FailureKind::Embedding,
        message: error.to_string(),
        used_chunks: Vec::new(),
    }
}
