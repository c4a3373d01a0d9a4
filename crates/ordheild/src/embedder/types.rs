//! Types for the word embedder module.

use thiserror::Error;

/// Errors specific to word-level embedding.
#[derive(Debug, Error)]
pub enum WordEmbedderError {
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Embedding failed.
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(#[from] anyhow::Error),
}

/// Result type for word embedder operations.
pub type WordEmbedderResult<T> = Result<T, WordEmbedderError>;
