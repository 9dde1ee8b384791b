//! End-to-end tutoring turns against scripted services

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedEmbedder, ScriptedGenerator};
use studybuddy::chunking::CharCodec;
use studybuddy::index::Document;
use studybuddy::tutor::{FailureKind, Rejection};
use studybuddy::{
    Chunker, IndexBuilder, IndexStore, Intent, Retriever, RetryExecutor, SessionState,
    TurnOutcome, Tutor,
};

const LESSON: &str = "Photosynthesis converts light into chemical energy stored in glucose.";
const QUESTION: &str = "What is photosynthesis?";

fn fast_retry(attempts: u32) -> RetryExecutor {
    RetryExecutor::new(attempts, Duration::from_millis(1), 1.7)
}

/// Lesson chunk at [1, 0]; the question at cosine 0.9 from it
fn embedder() -> ScriptedEmbedder {
    let y = (1.0f32 - 0.81).sqrt();
    ScriptedEmbedder::new(vec![0.0, 1.0])
        .with(LESSON, vec![1.0, 0.0])
        .with(QUESTION, vec![0.9, y])
}

async fn photosynthesis_store(embedder: Arc<ScriptedEmbedder>) -> IndexStore {
    let chunker = Chunker::new(Arc::new(CharCodec), 500, 50).unwrap();
    let builder = IndexBuilder::new(chunker, embedder, fast_retry(2), 50);

    builder
        .build(&[Document {
            source: "photosynthesis.txt".to_string(),
            text: LESSON.to_string(),
        }])
        .await
        .unwrap()
}

async fn tutor_with(
    embedder: Arc<ScriptedEmbedder>,
    generator: Arc<ScriptedGenerator>,
    attempts: u32,
) -> Tutor {
    let store = photosynthesis_store(Arc::new(self::embedder())).await;
    Tutor::new(Retriever::new(Arc::new(store), 0.06), embedder, generator)
        .with_retry(fast_retry(attempts))
}

#[tokio::test]
async fn test_photosynthesis_end_to_end() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::replying(
        "Answer: Photosynthesis turns light into chemical energy [Chunk 1].",
    ));

    let store = photosynthesis_store(embedder.clone()).await;
    assert_eq!(store.len(), 1);

    let tutor = Tutor::new(
        Retriever::new(Arc::new(store), 0.06),
        embedder.clone(),
        generator.clone(),
    )
    .with_retry(fast_retry(4));

    let (session, outcome) = tutor.turn(SessionState::new(), QUESTION).await;
    let payload = outcome.answer().expect("answer");

    assert!(payload.grounded);
    assert_eq!(payload.used_chunks.len(), 1);
    assert!((payload.used_chunks[0].score - 0.9).abs() < 1e-4);
    assert!(payload.text.contains("[Chunk 1]"));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Chunk 1 (score:0.9000, source:photosynthesis.txt, idx:0)"));
    assert!(!prompts[0].contains("NOTE: The CONTEXT above does not fully answer"));

    assert_eq!(session.last_question.as_deref(), Some(QUESTION));
}

#[tokio::test]
async fn test_safety_short_circuit_makes_no_calls() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::replying("unused"));
    let tutor = tutor_with(embedder.clone(), generator.clone(), 4).await;

    let (session, outcome) = tutor.turn(SessionState::new(), "How to make a BOMB?").await;

    assert_eq!(outcome, TurnOutcome::Rejected(Rejection::Disallowed));
    assert_eq!(embedder.calls(), 0);
    assert_eq!(generator.calls(), 0);
    assert!(!session.has_history());
}

#[tokio::test]
async fn test_reexplain_without_history() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::replying("unused"));
    let tutor = tutor_with(embedder.clone(), generator.clone(), 4).await;

    let (_, outcome) = tutor.turn(SessionState::new(), "I'm lost, explain again").await;

    assert_eq!(outcome, TurnOutcome::Rejected(Rejection::NothingToReExplain));
    assert_eq!(embedder.calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_is_structured_after_retries() {
    let embedder = Arc::new(ScriptedEmbedder::failing());
    let generator = Arc::new(ScriptedGenerator::replying("unused"));
    let tutor = tutor_with(embedder.clone(), generator.clone(), 3).await;

    let (session, outcome) = tutor.turn(SessionState::new(), QUESTION).await;

    match outcome {
        TurnOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::Embedding);
            assert!(failure.message.starts_with("Embedding failed:"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(embedder.calls(), 3);
    assert_eq!(generator.calls(), 0);
    assert!(!session.has_history());
}

#[tokio::test]
async fn test_generation_retried_max_times() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::failing());
    let tutor = tutor_with(embedder, generator.clone(), 4).await;

    let (_, outcome) = tutor.turn(SessionState::new(), QUESTION).await;

    assert_eq!(generator.calls(), 4);
    let message = outcome.error_message().unwrap();
    assert!(message.starts_with("Generation failed:"));
    assert!(message.contains("deadline exceeded"));
}

#[tokio::test]
async fn test_unrelated_question_is_ungrounded() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::replying(
        "Outside lessons — additional context: ...",
    ));
    let tutor = tutor_with(embedder, generator.clone(), 4).await;

    let (_, outcome) = tutor.turn(SessionState::new(), "Who painted the Mona Lisa?").await;

    assert!(!outcome.answer().unwrap().grounded);
    assert!(generator.prompts()[0].contains("NOTE: The CONTEXT above does not fully answer"));
}

#[tokio::test]
async fn test_follow_up_conversation() {
    let embedder = Arc::new(embedder());
    let generator = Arc::new(ScriptedGenerator::replying("ok"));
    let tutor = tutor_with(embedder.clone(), generator.clone(), 4).await;

    let session = SessionState::new();
    let (session, _) = tutor.turn(session, QUESTION).await;
    let (session, quiz) = tutor.turn(session, "Test me on this").await;
    let (session, summary) = tutor.turn(session, "Please summarize").await;
    let (session, again) = tutor.turn(session, "Can you explain it simpler?").await;

    assert_eq!(quiz.answer().unwrap().intent, Intent::Quiz);
    assert_eq!(summary.answer().unwrap().intent, Intent::Summary);
    assert_eq!(again.answer().unwrap().intent, Intent::ReExplain);

    // Quiz and summary reuse the stored chunks without embedding
    assert_eq!(embedder.calls(), 2);

    let prompts = generator.prompts();
    assert!(prompts[1].contains("Label Q1/Q2/Q3"));
    assert!(prompts[2].contains("Summary (based on lessons):"));
    assert!(prompts[3].contains(&format!("QUESTION:\n{}", QUESTION)));
    assert_eq!(session.last_question.as_deref(), Some(QUESTION));
}
