//! Embedding error types.

use thiserror::Error;

/// Errors that can occur while representing or comparing messages.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Nothing left to represent after tokenization
    #[error("Empty input: no tokens to represent")]
    EmptyInput,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
