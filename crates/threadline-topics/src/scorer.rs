//! Message-to-topic similarity scoring.
//!
//! The scorer holds the injected capabilities and nothing else. Centroids
//! are recomputed on every call because topics keep growing; message
//! representations are cached on the messages themselves, keyed by the
//! processor id.

use std::sync::Arc;

use threadline_embeddings::{Processor, Representation, Similarity, Tokenizer};
use threadline_types::Message;

use crate::error::TopicsError;
use crate::similarity::calculate_centroid;
use crate::types::Topic;

/// Scores how well a message fits a topic.
#[derive(Clone)]
pub struct SimilarityScorer {
    processor: Processor,
    similarity: Arc<dyn Similarity>,
}

impl std::fmt::Debug for SimilarityScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityScorer")
            .field("processor", &self.processor)
            .field("similarity", &self.similarity.name())
            .finish()
    }
}

impl SimilarityScorer {
    /// Compose a scorer from a representation, a similarity and an optional
    /// tokenizer.
    pub fn new(
        representation: Arc<dyn Representation>,
        similarity: Arc<dyn Similarity>,
        tokenizer: Option<Arc<dyn Tokenizer>>,
    ) -> Result<Self, TopicsError> {
        if representation.dimension() == 0 {
            return Err(TopicsError::InvalidConfig(format!(
                "representation '{}' has zero dimension",
                representation.name()
            )));
        }
        Ok(Self {
            processor: Processor::new(representation, tokenizer),
            similarity,
        })
    }

    /// The composed `text -> vector` processor; its id keys message caches.
    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Ensure `message` has a current representation.
    pub fn process(&self, message: &mut Message) -> Result<(), TopicsError> {
        let message_id = message.id();
        self.processor
            .process(message)
            .map_err(|e| TopicsError::from_representation(message_id, e))
    }

    fn representation<'m>(&self, message: &'m Message) -> Result<&'m [f32], TopicsError> {
        message
            .representation_for(self.processor.id())
            .ok_or_else(|| {
                TopicsError::InvalidInput(format!("message {} is not processed", message.id()))
            })
    }

    /// Mean representation of every message in `topic`.
    ///
    /// Messages with a stale or missing representation are processed first.
    pub fn centroid(&self, topic: &mut Topic) -> Result<Vec<f32>, TopicsError> {
        for entry in topic.entries_mut() {
            self.process(&mut entry.message)?;
        }
        let vectors = topic
            .messages()
            .map(|m| self.representation(m))
            .collect::<Result<Vec<&[f32]>, TopicsError>>()?;
        calculate_centroid(&vectors)
    }

    /// Similarity between two representations.
    pub fn compare(&self, a: &[f32], b: &[f32]) -> Result<f32, TopicsError> {
        Ok(self.similarity.similarity(a, b)?)
    }

    /// Similarity between the topic centroid and `message`.
    pub fn similarity(&self, topic: &mut Topic, message: &mut Message) -> Result<f32, TopicsError> {
        self.process(message)?;
        let centroid = self.centroid(topic)?;
        self.compare(&centroid, self.representation(message)?)
    }

    /// Similarity between `message` and each topic message, in topic order.
    pub fn message_similarities(
        &self,
        topic: &mut Topic,
        message: &mut Message,
    ) -> Result<Vec<f32>, TopicsError> {
        self.process(message)?;
        let target = self.representation(message)?;
        let mut scores = Vec::with_capacity(topic.size());
        for entry in topic.entries_mut() {
            self.process(&mut entry.message)?;
            let repr = self.representation(&entry.message)?;
            scores.push(self.compare(repr, target)?);
        }
        Ok(scores)
    }
}
