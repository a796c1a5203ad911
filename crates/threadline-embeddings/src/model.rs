//! Capability traits and the composed message processor.
//!
//! Each capability is a single-purpose trait injected into the scorer.
//! Implementations must be thread-safe (Send + Sync) so one scorer can be
//! shared read-only across independent classification runs.

use std::fmt;
use std::sync::Arc;

use threadline_types::Message;
use tracing::trace;

use crate::error::EmbeddingError;

/// Text to fixed-length vector.
pub trait Representation: Send + Sync {
    /// Stable name, used as part of the processor id.
    fn name(&self) -> &str;

    /// Length of every vector this representation produces.
    fn dimension(&self) -> usize;

    /// Represent a (possibly pre-cleaned) text.
    ///
    /// Returns [`EmbeddingError::EmptyInput`] when the text has nothing to
    /// represent.
    fn represent(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Pair of vectors to a similarity score.
///
/// Scores are normalized to [0, 1]; 1 = identical, 0 = unrelated.
pub trait Similarity: Send + Sync {
    /// Stable name for diagnostics.
    fn name(&self) -> &str;

    /// Compare two vectors of equal dimension.
    ///
    /// Returns [`EmbeddingError::DimensionMismatch`] if lengths differ.
    fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError>;
}

/// Text cleaning applied before representation.
pub trait Tokenizer: Send + Sync {
    /// Stable name, used as part of the processor id.
    fn name(&self) -> &str;

    /// Split text into normalized tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Cleaned text handed to the representation.
    fn clean(&self, text: &str) -> String {
        self.tokenize(text).join(" ")
    }
}

/// Tokenizer and representation composed into one `text -> vector` function.
///
/// The processor id (`t:<tokenizer>#r:<representation>`) is the cache key
/// stored on each message; messages processed by a different configuration
/// are reprocessed.
#[derive(Clone)]
pub struct Processor {
    id: String,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    representation: Arc<dyn Representation>,
}

impl Processor {
    /// Compose a representation with an optional tokenizer.
    pub fn new(
        representation: Arc<dyn Representation>,
        tokenizer: Option<Arc<dyn Tokenizer>>,
    ) -> Self {
        let id = format!(
            "t:{}#r:{}",
            tokenizer.as_ref().map_or("none", |t| t.name()),
            representation.name()
        );
        Self {
            id,
            tokenizer,
            representation,
        }
    }

    /// Cache key for representations produced by this processor.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dimension of the produced vectors.
    pub fn dimension(&self) -> usize {
        self.representation.dimension()
    }

    pub fn has_tokenizer(&self) -> bool {
        self.tokenizer.is_some()
    }

    /// Represent raw text.
    pub fn represent(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let vector = match &self.tokenizer {
            Some(tokenizer) => self.representation.represent(&tokenizer.clean(text))?,
            None => self.representation.represent(text)?,
        };
        let expected = self.representation.dimension();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Ensure `message` carries a representation from this processor.
    ///
    /// No-op when the cached representation already has this processor's id.
    pub fn process(&self, message: &mut Message) -> Result<(), EmbeddingError> {
        if message.is_processed_by(&self.id) {
            return Ok(());
        }
        let vector = self.represent(message.text())?;
        trace!(message_id = message.id(), processor = %self.id, "Processed message");
        message.set_representation(self.id.clone(), vector);
        Ok(())
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("id", &self.id)
            .field("dimension", &self.dimension())
            .finish()
    }
}
