//! Error types for studybuddy
//!
//! `TutorError` covers the index build and query-time plumbing. Remote
//! calls fail with `ServiceError`, whose kind drives the retry policy.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tutor
#[derive(Error, Debug)]
pub enum TutorError {
    /// A persisted index file is absent at query time
    #[error("Index artifact missing: {path} (run `studybuddy build` first)")]
    MissingIndexArtifact { path: PathBuf },

    /// The persisted artifacts disagree with each other
    #[error("Index is corrupt: {0}")]
    CorruptIndex(String),

    /// A lesson file could not be turned into text
    #[error("Unreadable document {path}: {reason}")]
    UnreadableDocument { path: PathBuf, reason: String },

    /// The lessons folder does not exist
    #[error("Lessons directory not found: {0}")]
    LessonsDirMissing(PathBuf),

    /// Every lesson file was skipped
    #[error("No readable lessons under {0}; add .txt, .md or .csv files and rebuild")]
    NoDocuments(PathBuf),

    /// Embedding service failed after retries
    #[error("Embedding failed: {0}")]
    EmbeddingFailure(#[source] ServiceError),

    /// Generation service failed after retries
    #[error("Generation failed: {0}")]
    GenerationFailure(#[source] ServiceError),

    /// Query vector does not match the index dimension
    #[error("Embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Tokenizer loading or encoding errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for tutor operations
pub type Result<T> = std::result::Result<T, TutorError>;

/// Failure categories at the remote-call boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Connection refused, DNS, broken pipe
    Transport,
    /// Request exceeded the client timeout
    Timeout,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    Server,
    /// HTTP 401/403
    Unauthorized,
    /// Other HTTP 4xx
    InvalidRequest,
    /// Body did not match any known response shape
    MalformedResponse,
}

impl ServiceErrorKind {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ServiceErrorKind::Transport
                | ServiceErrorKind::Timeout
                | ServiceErrorKind::RateLimited
                | ServiceErrorKind::Server
        )
    }

    /// Map an HTTP status code to a kind
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ServiceErrorKind::Unauthorized,
            429 => ServiceErrorKind::RateLimited,
            500..=599 => ServiceErrorKind::Server,
            _ => ServiceErrorKind::InvalidRequest,
        }
    }
}

/// Error returned by the embedding and generation services
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::MalformedResponse, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ServiceErrorKind::Timeout
        } else if err.is_decode() {
            ServiceErrorKind::MalformedResponse
        } else if let Some(status) = err.status() {
            ServiceErrorKind::from_status(status.as_u16())
        } else {
            ServiceErrorKind::Transport
        };
        ServiceError::new(kind, err.to_string())
    }
}
