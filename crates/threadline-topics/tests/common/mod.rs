//! Shared fixtures for classifier integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use threadline_embeddings::{CosineSimilarity, EmbeddingError, Representation};
use threadline_topics::{ClassifierConfig, SimilarityScorer, Topic, TopicClassifier, Window};
use threadline_types::{Message, MessageId};

/// Representation that reads its vector straight from the numbers in the
/// message text ("1 0 0" -> [1, 0, 0]). Words are ignored; text without
/// numbers cannot be represented.
pub struct ParsedRepr;

impl Representation for ParsedRepr {
    fn name(&self) -> &str {
        "parsed"
    }

    fn dimension(&self) -> usize {
        3
    }

    fn represent(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let values: Vec<f32> = text
            .split_whitespace()
            .filter_map(|t| t.parse().ok())
            .collect();
        if values.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }
        Ok(values)
    }
}

pub fn scorer() -> Arc<SimilarityScorer> {
    Arc::new(
        SimilarityScorer::new(Arc::new(ParsedRepr), Arc::new(CosineSimilarity), None)
            .expect("valid scorer"),
    )
}

pub fn classifier(config: ClassifierConfig) -> TopicClassifier {
    TopicClassifier::new(config, scorer()).expect("valid config")
}

pub fn msg(id: MessageId, text: &str) -> Message {
    Message::new(id, "alice", text)
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Single topic holding `texts` in order, ids starting at `first_id`.
pub fn topic_of(first_id: MessageId, texts: &[&str]) -> Topic {
    let mut iter = texts.iter().enumerate();
    let (_, seed) = iter.next().expect("at least one text");
    let mut topic = Topic::new(msg(first_id, seed), "seed");
    for (offset, text) in iter {
        topic.append(msg(first_id + offset as u64, text), "fixture");
    }
    topic
}

/// Window holding `topics`, the first one most recent.
pub fn window_of(topics: Vec<Topic>) -> Window {
    let mut window = Window::unbounded();
    for topic in topics.into_iter().rev() {
        window.activate(topic);
    }
    window
}

pub fn message_ids(topic: &Topic) -> Vec<MessageId> {
    topic.messages().map(|m| m.id()).collect()
}
