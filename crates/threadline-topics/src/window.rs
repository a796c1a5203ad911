//! Window of active topics.
//!
//! Topics are kept most-recently-touched first. Every mutation funnels
//! through [`Window::activate`]: a member topic moves to the front, a new one
//! is inserted at the front after evicting the back topic if the window is
//! full. Iteration order is most-recent first unless stated otherwise.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use threadline_types::Message;
use tracing::{debug, warn};

use crate::error::TopicsError;
use crate::types::{Topic, TopicId};

/// Bounded, recency-ordered set of topics.
#[derive(Debug, Clone, Default)]
pub struct Window {
    topics: VecDeque<Topic>,
    capacity: Option<usize>,
}

impl Window {
    /// Create a window; `None` capacity means unbounded.
    ///
    /// A capacity of zero is raised to one: the topic just activated always
    /// stays in the window.
    pub fn new(capacity: Option<usize>) -> Self {
        if capacity == Some(0) {
            warn!("Window capacity 0 raised to 1");
        }
        Self {
            topics: VecDeque::new(),
            capacity: capacity.map(|cap| cap.max(1)),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Whether activating a new topic would evict one.
    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|cap| self.topics.len() >= cap)
    }

    /// Topic at `index`; 0 is the most recent.
    pub fn get(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Topic> {
        self.topics.get_mut(index)
    }

    /// The most recently touched topic.
    pub fn front(&self) -> Option<&Topic> {
        self.topics.front()
    }

    /// Position of the topic with `topic_id`.
    pub fn position(&self, topic_id: &TopicId) -> Option<usize> {
        self.topics.iter().position(|t| t.id() == topic_id)
    }

    pub fn contains(&self, topic_id: &TopicId) -> bool {
        self.position(topic_id).is_some()
    }

    /// Topics, most recent first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Topic> + ExactSizeIterator {
        self.topics.iter()
    }

    /// Topics, oldest first.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter().rev()
    }

    /// Latest `last_touched` across all topics.
    pub fn last_touched(&self) -> Option<DateTime<Utc>> {
        self.topics.iter().filter_map(Topic::last_touched).max()
    }

    /// Make `topic` the most recent.
    ///
    /// A topic already present (same id) is reordered: the stored topic
    /// moves to the front and `topic` is dropped. Otherwise it is inserted at
    /// the front, evicting the back topic first when full; the evicted topic
    /// is returned.
    pub fn activate(&mut self, topic: Topic) -> Option<Topic> {
        if let Some(index) = self.position(topic.id()) {
            if let Some(stored) = self.topics.remove(index) {
                self.topics.push_front(stored);
            }
            return None;
        }

        let evicted = if self.is_full() {
            self.topics.pop_back()
        } else {
            None
        };
        if let Some(old) = &evicted {
            debug!(topic_id = %old.id(), size = old.size(), "Evicted stalest topic");
        }
        self.topics.push_front(topic);
        evicted
    }

    /// Move the topic at `index` to the front.
    pub fn promote(&mut self, index: usize) -> Result<(), TopicsError> {
        let topic = self.topics.remove(index).ok_or(TopicsError::IndexOutOfRange {
            index,
            len: self.topics.len(),
        })?;
        self.topics.push_front(topic);
        Ok(())
    }

    /// Append a message to the topic at `index`, optionally promoting it.
    ///
    /// Returns the id of the topic that received the message.
    pub fn insert_message(
        &mut self,
        index: usize,
        message: Message,
        reason: impl Into<String>,
        promote: bool,
    ) -> Result<TopicId, TopicsError> {
        let len = self.topics.len();
        let topic = self
            .topics
            .get_mut(index)
            .ok_or(TopicsError::IndexOutOfRange { index, len })?;
        topic.append(message, reason);
        let topic_id = topic.id().clone();
        if promote && index != 0 {
            self.promote(index)?;
        }
        Ok(topic_id)
    }

    /// Consume the window, yielding topics most recent first.
    pub fn into_topics(self) -> Vec<Topic> {
        self.topics.into()
    }
}

impl<'a> IntoIterator for &'a Window {
    type Item = &'a Topic;
    type IntoIter = std::collections::vec_deque::Iter<'a, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: u64) -> Topic {
        Topic::new(Message::new(id, "alice", format!("message {}", id)), "seed")
    }

    fn ids(window: &Window) -> Vec<TopicId> {
        window.iter().map(|t| t.id().clone()).collect()
    }

    #[test]
    fn test_new_window_empty() {
        let window = Window::with_capacity(3);
        assert!(window.is_empty());
        assert!(!window.is_full());
        assert_eq!(window.len(), 0);
        assert_eq!(window.capacity(), Some(3));
    }

    #[test]
    fn test_unbounded_never_full() {
        let mut window = Window::unbounded();
        for i in 0..50 {
            assert!(window.activate(topic(i)).is_none());
        }
        assert_eq!(window.len(), 50);
        assert!(!window.is_full());
    }

    #[test]
    fn test_activate_inserts_at_front() {
        let mut window = Window::unbounded();
        let a = topic(1);
        let b = topic(2);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        window.activate(a);
        window.activate(b);
        assert_eq!(ids(&window), vec![b_id, a_id]);
    }

    #[test]
    fn test_activate_member_moves_to_front_without_duplicate() {
        let mut window = Window::unbounded();
        let a = topic(1);
        let a_copy = a.clone();
        let b = topic(2);
        let (a_id, b_id) = (a.id().clone(), b.id().clone());
        window.activate(a);
        window.activate(b);

        assert!(window.activate(a_copy).is_none());
        assert_eq!(ids(&window), vec![a_id, b_id]);
    }

    #[test]
    fn test_activate_member_keeps_stored_messages() {
        let mut window = Window::unbounded();
        let a = topic(1);
        let stale = a.clone();
        window.activate(a);
        window
            .insert_message(0, Message::new(2, "bob", "more"), "test", true)
            .unwrap();
        window.activate(topic(3));

        assert!(window.activate(stale).is_none());
        assert_eq!(window.len(), 2);
        let front = window.front().unwrap();
        assert_eq!(front.start_message().id(), 1);
        assert_eq!(front.size(), 2);
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let mut window = Window::with_capacity(0);
        assert_eq!(window.capacity(), Some(1));

        assert!(window.activate(topic(1)).is_none());
        let evicted = window.activate(topic(2)).unwrap();
        assert_eq!(evicted.start_message().id(), 1);
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_activate_twice_is_idempotent() {
        let mut window = Window::unbounded();
        let a = topic(1);
        window.activate(topic(2));
        window.activate(a.clone());
        let once = ids(&window);
        window.activate(a);
        assert_eq!(ids(&window), once);
    }

    #[test]
    fn test_activate_evicts_back_when_full() {
        let mut window = Window::with_capacity(2);
        let first = topic(1);
        let first_id = first.id().clone();
        window.activate(first);
        window.activate(topic(2));
        assert!(window.is_full());

        let evicted = window.activate(topic(3)).unwrap();
        assert_eq!(evicted.id(), &first_id);
        assert_eq!(window.len(), 2);
        assert!(!window.contains(&first_id));
    }

    #[test]
    fn test_activate_member_when_full_does_not_evict() {
        let mut window = Window::with_capacity(2);
        let a = topic(1);
        window.activate(a.clone());
        window.activate(topic(2));
        assert!(window.activate(a).is_none());
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_insert_message_promotes() {
        let mut window = Window::unbounded();
        let a = topic(1);
        let a_id = a.id().clone();
        window.activate(a);
        window.activate(topic(2));

        let target = window
            .insert_message(1, Message::new(3, "bob", "reply"), "test", true)
            .unwrap();
        assert_eq!(target, a_id);
        assert_eq!(window.front().unwrap().id(), &a_id);
        assert_eq!(window.front().unwrap().size(), 2);
    }

    #[test]
    fn test_insert_message_without_promotion_keeps_order() {
        let mut window = Window::unbounded();
        let a = topic(1);
        let a_id = a.id().clone();
        window.activate(a);
        window.activate(topic(2));

        window
            .insert_message(1, Message::new(3, "bob", "reply"), "test", false)
            .unwrap();
        assert_eq!(window.get(1).unwrap().id(), &a_id);
        assert_eq!(window.get(1).unwrap().size(), 2);
    }

    #[test]
    fn test_insert_message_out_of_range() {
        let mut window = Window::unbounded();
        let err = window
            .insert_message(0, Message::new(1, "a", "x"), "r", true)
            .unwrap_err();
        assert!(matches!(
            err,
            TopicsError::IndexOutOfRange { index: 0, len: 0 }
        ));
    }

    #[test]
    fn test_iteration_orders() {
        let mut window = Window::unbounded();
        window.activate(topic(1));
        window.activate(topic(2));
        window.activate(topic(3));

        let newest: Vec<u64> = window.iter().map(|t| t.start_message().id()).collect();
        let oldest: Vec<u64> = window
            .iter_oldest_first()
            .map(|t| t.start_message().id())
            .collect();
        assert_eq!(newest, vec![3, 2, 1]);
        assert_eq!(oldest, vec![1, 2, 3]);
    }

    #[test]
    fn test_last_touched_is_latest() {
        use chrono::TimeZone;
        let mut window = Window::unbounded();
        let t1 = Utc.timestamp_opt(100, 0).unwrap();
        let t2 = Utc.timestamp_opt(200, 0).unwrap();
        window.activate(Topic::new(Message::new(1, "a", "x").with_timestamp(t2), "s"));
        window.activate(Topic::new(Message::new(2, "a", "y").with_timestamp(t1), "s"));
        assert_eq!(window.last_touched(), Some(t2));
    }
}
