//! Topic data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadline_types::Message;

/// A unique identifier for a topic (ULID).
pub type TopicId = String;

/// A message admitted to a topic, with the reason it was admitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntry {
    pub message: Message,
    pub reason: String,
}

/// One conversational thread: an ordered run of messages.
///
/// Topics are compared by identity (`topic_id`), never by content; two
/// topics holding the same messages are distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    topic_id: TopicId,
    start_message: Message,
    entries: Vec<TopicEntry>,
    last_touched: Option<DateTime<Utc>>,
}

impl Topic {
    /// Start a topic seeded by `message`.
    pub fn new(message: Message, reason: impl Into<String>) -> Self {
        let last_touched = message.timestamp();
        Self {
            topic_id: ulid::Ulid::new().to_string(),
            start_message: message.clone(),
            entries: vec![TopicEntry {
                message,
                reason: reason.into(),
            }],
            last_touched,
        }
    }

    pub fn id(&self) -> &TopicId {
        &self.topic_id
    }

    /// The message that seeded this topic.
    pub fn start_message(&self) -> &Message {
        &self.start_message
    }

    /// Append a message with the reason it was admitted.
    pub fn append(&mut self, message: Message, reason: impl Into<String>) {
        if let Some(ts) = message.timestamp() {
            self.last_touched = Some(ts);
        }
        self.entries.push(TopicEntry {
            message,
            reason: reason.into(),
        });
    }

    /// Number of admitted messages.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once constructed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TopicEntry] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [TopicEntry] {
        &mut self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.reason.as_str())
    }

    /// Timestamp of the most recently appended timestamped message.
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        self.last_touched
    }

    /// Distinct authors in order of first appearance.
    pub fn authors(&self) -> Vec<&str> {
        let mut authors: Vec<&str> = Vec::new();
        for message in self.messages() {
            if !authors.contains(&message.author()) {
                authors.push(message.author());
            }
        }
        authors
    }

    /// Fold `other` into this topic.
    ///
    /// Entries are concatenated and re-sorted by message id (stable, so equal
    /// ids keep their relative order); reasons travel with their messages.
    /// This topic keeps its identity and start message.
    pub fn absorb(&mut self, other: Topic) {
        self.last_touched = match (self.last_touched, other.last_touched) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.entries.extend(other.entries);
        self.entries.sort_by_key(|e| e.message.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(id: u64, author: &str, text: &str) -> Message {
        Message::new(id, author, text)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_topic_new() {
        let topic = Topic::new(msg(1, "alice", "deploy?"), "window empty");
        assert_eq!(topic.size(), 1);
        assert!(!topic.is_empty());
        assert_eq!(topic.start_message().id(), 1);
        assert_eq!(topic.reasons().collect::<Vec<_>>(), vec!["window empty"]);
        assert!(topic.last_touched().is_none());
    }

    #[test]
    fn test_append_preserves_order_and_reasons() {
        let mut topic = Topic::new(msg(1, "alice", "deploy?"), "window empty");
        topic.append(msg(2, "bob", "yes"), "grammatically reply starter yes");
        topic.append(msg(3, "alice", "thanks"), "similarity");

        let ids: Vec<u64> = topic.messages().map(|m| m.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(topic.entries()[1].reason, "grammatically reply starter yes");
        assert_eq!(topic.size(), 3);
    }

    #[test]
    fn test_last_touched_tracks_latest_append() {
        let mut topic = Topic::new(msg(1, "a", "x").with_timestamp(at(100)), "seed");
        assert_eq!(topic.last_touched(), Some(at(100)));
        topic.append(msg(2, "b", "y").with_timestamp(at(160)), "r");
        assert_eq!(topic.last_touched(), Some(at(160)));
        // Untimestamped messages leave it unchanged
        topic.append(msg(3, "c", "z"), "r");
        assert_eq!(topic.last_touched(), Some(at(160)));
    }

    #[test]
    fn test_identity_not_content() {
        let a = Topic::new(msg(1, "alice", "same"), "seed");
        let b = Topic::new(msg(1, "alice", "same"), "seed");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_authors_distinct_in_order() {
        let mut topic = Topic::new(msg(1, "alice", "a"), "seed");
        topic.append(msg(2, "bob", "b"), "r");
        topic.append(msg(3, "alice", "c"), "r");
        assert_eq!(topic.authors(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_absorb_sorts_by_id_and_keeps_reasons() {
        let mut a = Topic::new(msg(1, "alice", "one").with_timestamp(at(10)), "seed a");
        a.append(msg(4, "alice", "four").with_timestamp(at(40)), "a4");

        let mut b = Topic::new(msg(2, "bob", "two").with_timestamp(at(20)), "seed b");
        b.append(msg(5, "bob", "five").with_timestamp(at(50)), "b5");

        let a_id = a.id().clone();
        a.absorb(b);

        let ids: Vec<u64> = a.messages().map(|m| m.id()).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
        let reasons: Vec<&str> = a.reasons().collect();
        assert_eq!(reasons, vec!["seed a", "seed b", "a4", "b5"]);
        assert_eq!(a.id(), &a_id);
        assert_eq!(a.start_message().id(), 1);
        assert_eq!(a.last_touched(), Some(at(50)));
        assert_eq!(a.size(), 4);
    }
}
