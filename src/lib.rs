//! studybuddy - a lesson-grounded study tutor
//!
//! Lesson files are chunked into overlapping token windows, embedded, and
//! stored as a flat index. At question time the index is searched by cosine
//! similarity, the best chunks are rendered into a teaching prompt, and the
//! generated answer is returned with the chunks it used.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod errors;
pub mod index;
pub mod intent;
pub mod prompt;
pub mod repl;
pub mod retrieval;
pub mod retry;
pub mod safety;
pub mod service;
pub mod session;
pub mod tutor;

pub use chunking::Chunker;
pub use config::Config;
pub use errors::{Result, ServiceError, ServiceErrorKind, TutorError};
pub use index::{ChunkMetadata, IndexBuilder, IndexStore};
pub use intent::{Intent, IntentClassifier};
pub use prompt::PromptBuilder;
pub use retrieval::{cosine_similarity, RetrievalResult, Retriever, ScoredChunk};
pub use retry::{RetryExecutor, RetryPolicy};
pub use safety::SafetyFilter;
pub use service::{EmbeddingService, GenerationService, TaskType};
pub use session::SessionState;
pub use tutor::{Tutor, TurnOutcome};
