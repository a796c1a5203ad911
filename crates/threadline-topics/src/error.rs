//! Topic error types.

use thiserror::Error;
use threadline_embeddings::EmbeddingError;
use threadline_types::MessageId;

/// Errors that can occur during topic classification.
#[derive(Debug, Error)]
pub enum TopicsError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Representations of different lengths were combined or compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A message could not be represented; the message is skippable
    #[error("Representation failed for message {message_id}: {source}")]
    Representation {
        message_id: MessageId,
        source: EmbeddingError,
    },

    /// Topic index outside the window
    #[error("Topic index {index} out of range for window of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TopicsError {
    /// Whether the stream may continue after this error.
    ///
    /// Only per-message representation failures are recoverable; everything
    /// else is a configuration or programming error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TopicsError::Representation { .. })
    }

    /// Map an error raised while representing `message_id`.
    pub(crate) fn from_representation(message_id: MessageId, err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                TopicsError::DimensionMismatch { expected, actual }
            }
            source => TopicsError::Representation { message_id, source },
        }
    }
}

impl From<EmbeddingError> for TopicsError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::DimensionMismatch { expected, actual } => {
                TopicsError::DimensionMismatch { expected, actual }
            }
            other => TopicsError::InvalidInput(other.to_string()),
        }
    }
}
