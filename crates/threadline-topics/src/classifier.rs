//! Streaming topic classifier.
//!
//! For each incoming message, in order:
//!
//! 1. Represent the message (cached per processor id).
//! 2. Empty window: start the first topic.
//! 3. Time proximity (optional): a message close enough to the latest
//!    activity joins the most recent topic without promotion.
//! 4. Reply detection (optional): a grammatical continuation joins the most
//!    recent topic.
//! 5. Similarity, by the configured [`DecisionPolicy`]:
//!    - elastic: first-fit sweep over the most recent topics with
//!      size-dependent thresholds that tighten for older candidates;
//!    - global threshold: best centroid similarity, falling back to a
//!      singleton most-recent topic.
//! 6. Otherwise start a new topic, recording the rejected scores.
//!
//! The classifier keeps no state between calls; all state lives in the
//! [`Window`] passed in.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use threadline_types::{Message, MessageId};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{ClassifierConfig, DecisionPolicy, ElasticConfig, ThresholdConfig};
use crate::error::TopicsError;
use crate::reply::ReplyDetector;
use crate::scorer::SimilarityScorer;
use crate::threshold::{elastic_accepts, elastic_threshold, ElasticBranch, SweepThresholds};
use crate::types::{Topic, TopicId};
use crate::window::Window;

/// Why a message landed where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Started a new topic
    NewTopic,
    /// Appended as a grammatical reply
    Reply,
    /// Appended because it arrived shortly after the latest activity
    TimeDecay,
    /// Appended to a topic judged similar enough
    Similarity,
    /// Appended to a most-recent topic holding a single message
    SingletonFallback,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::NewTopic => write!(f, "new_topic"),
            Decision::Reply => write!(f, "reply"),
            Decision::TimeDecay => write!(f, "time_decay"),
            Decision::Similarity => write!(f, "similarity"),
            Decision::SingletonFallback => write!(f, "singleton_fallback"),
        }
    }
}

/// Result of classifying one message.
#[derive(Debug, Clone)]
pub struct Classification {
    pub decision: Decision,
    /// Topic that received the message
    pub topic_id: TopicId,
    /// Reason recorded alongside the message
    pub reason: String,
    /// Topic pushed out of the window by a new topic, if any
    pub evicted: Option<Topic>,
}

impl Classification {
    fn appended(decision: Decision, topic_id: TopicId, reason: String) -> Self {
        Self {
            decision,
            topic_id,
            reason,
            evicted: None,
        }
    }
}

/// A message dropped from the stream, with the diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedMessage {
    pub message_id: MessageId,
    pub reason: String,
}

/// Summary of a stream run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamReport {
    /// Messages pulled from the input
    pub consumed: usize,
    /// Messages placed in a topic
    pub classified: usize,
    /// Topics started during the run
    pub new_topics: usize,
    /// Topics evicted from the window during the run
    pub evicted: usize,
    /// Messages dropped with a recoverable error
    pub skipped: Vec<SkippedMessage>,
}

enum SweepOutcome {
    Accept { index: usize, reason: String },
    Reject { rejected: Vec<(usize, u32)> },
}

/// Assigns each message of a stream to a topic in a [`Window`].
#[derive(Clone)]
pub struct TopicClassifier {
    config: ClassifierConfig,
    scorer: Arc<SimilarityScorer>,
    reply_detector: Option<Arc<dyn ReplyDetector>>,
}

impl fmt::Debug for TopicClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicClassifier")
            .field("config", &self.config)
            .field("scorer", &self.scorer)
            .field("reply_detector", &self.reply_detector.is_some())
            .finish()
    }
}

impl TopicClassifier {
    /// Create a classifier; the configuration is validated up front.
    pub fn new(config: ClassifierConfig, scorer: Arc<SimilarityScorer>) -> Result<Self, TopicsError> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            reply_detector: None,
        })
    }

    /// Enable reply detection.
    pub fn with_reply_detector(mut self, detector: Arc<dyn ReplyDetector>) -> Self {
        self.reply_detector = Some(detector);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// A fresh window sized by the configuration.
    pub fn new_window(&self) -> Window {
        Window::new(self.config.window_capacity)
    }

    /// Classify one message into `window`.
    ///
    /// Errors from [`TopicsError::is_recoverable`] leave the window
    /// untouched; the caller may skip the message and continue.
    pub fn classify(
        &self,
        window: &mut Window,
        message: Message,
    ) -> Result<Classification, TopicsError> {
        let message_id = message.id();
        let classification = self.decide(window, message)?;
        debug!(
            message_id,
            decision = %classification.decision,
            topic_id = %classification.topic_id,
            reason = %classification.reason,
            "Classified message"
        );
        Ok(classification)
    }

    fn decide(&self, window: &mut Window, mut message: Message) -> Result<Classification, TopicsError> {
        self.scorer.process(&mut message)?;

        if window.is_empty() {
            return Ok(start_topic(window, message, "window empty".to_string()));
        }

        if let Some(reason) = self.time_proximity(window, &message) {
            let topic_id = window.insert_message(0, message, reason.clone(), false)?;
            return Ok(Classification::appended(Decision::TimeDecay, topic_id, reason));
        }

        if let Some(detector) = &self.reply_detector {
            let verdict = detector.detect(message.text());
            if verdict.is_reply {
                let reason = format!("grammatically {}", verdict.reason);
                let topic_id = window.insert_message(0, message, reason.clone(), true)?;
                return Ok(Classification::appended(Decision::Reply, topic_id, reason));
            }
        }

        match &self.config.policy {
            DecisionPolicy::Elastic(cfg) => self.classify_elastic(window, message, cfg),
            DecisionPolicy::GlobalThreshold(cfg) => self.classify_global(window, message, cfg),
        }
    }

    /// Reason string when `message` is close enough in time to the latest
    /// activity in the window.
    fn time_proximity(&self, window: &Window, message: &Message) -> Option<String> {
        let decay = self.config.time_decay.as_ref()?;
        let current = message.timestamp()?;
        let last = window.last_touched()?;

        let gap_ms = (current - last).num_milliseconds();
        let limit_ms = i64::try_from(decay.within_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        if (0..limit_ms).contains(&gap_ms) {
            Some(format!(
                "within {}s of previous message (gap {:.1}s)",
                decay.within_secs,
                gap_ms as f64 / 1000.0
            ))
        } else {
            None
        }
    }

    fn classify_elastic(
        &self,
        window: &mut Window,
        mut message: Message,
        config: &ElasticConfig,
    ) -> Result<Classification, TopicsError> {
        match self.sweep(window, &mut message, config)? {
            SweepOutcome::Accept { index, reason } => {
                let topic_id = window.insert_message(index, message, reason.clone(), true)?;
                Ok(Classification::appended(Decision::Similarity, topic_id, reason))
            }
            SweepOutcome::Reject { rejected } => {
                let scores = rejected
                    .iter()
                    .map(|(size, score)| format!("(size {}, score {})", size, score))
                    .collect::<Vec<_>>()
                    .join(", ");
                let reason = format!("no similar topics, scores: [{}]", scores);
                Ok(start_topic(window, message, reason))
            }
        }
    }

    /// First-fit sweep over the most recent topics.
    fn sweep(
        &self,
        window: &mut Window,
        message: &mut Message,
        config: &ElasticConfig,
    ) -> Result<SweepOutcome, TopicsError> {
        let mut thresholds = SweepThresholds::new(config);
        let mut rejected = Vec::new();
        let len = window.len();
        let candidates = len.min(self.config.max_active_topics);

        for index in 0..candidates {
            let topic = window
                .get_mut(index)
                .ok_or(TopicsError::IndexOutOfRange { index, len })?;
            let similarities = self.scorer.message_similarities(topic, message)?;
            let score = thresholds.score(&similarities);
            let size = topic.size();

            if elastic_accepts(size, score as f32) {
                let reason = format!(
                    "size {} {}: score {} > {:.2}, similarities {}",
                    size,
                    ElasticBranch::for_size(size),
                    score,
                    elastic_threshold(size),
                    format_scores(&similarities)
                );
                return Ok(SweepOutcome::Accept { index, reason });
            }

            trace!(
                index,
                size,
                score,
                low = thresholds.low,
                high = thresholds.high,
                "Candidate topic rejected"
            );
            rejected.push((size, score));
            thresholds.advance();
        }

        Ok(SweepOutcome::Reject { rejected })
    }

    fn classify_global(
        &self,
        window: &mut Window,
        mut message: Message,
        config: &ThresholdConfig,
    ) -> Result<Classification, TopicsError> {
        let mut best: Option<(usize, f32)> = None;
        let len = window.len();
        for index in 0..len {
            let topic = window
                .get_mut(index)
                .ok_or(TopicsError::IndexOutOfRange { index, len })?;
            let similarity = self.scorer.similarity(topic, &mut message)?;
            if best.map_or(true, |(_, b)| similarity > b) {
                best = Some((index, similarity));
            }
        }

        let best_similarity = best.map_or(0.0, |(_, s)| s);
        if let Some((index, similarity)) = best.filter(|(_, s)| *s >= config.similarity_threshold) {
            let reason = format!(
                "similarity {:.3} >= threshold {}",
                similarity, config.similarity_threshold
            );
            let topic_id = window.insert_message(index, message, reason.clone(), true)?;
            return Ok(Classification::appended(Decision::Similarity, topic_id, reason));
        }

        if window.front().is_some_and(|t| t.size() == 1) {
            let reason = "previous topic with one element".to_string();
            let topic_id = window.insert_message(0, message, reason.clone(), true)?;
            return Ok(Classification::appended(
                Decision::SingletonFallback,
                topic_id,
                reason,
            ));
        }

        let reason = format!(
            "no similarity nor grammatically a reply (best similarity {:.3})",
            best_similarity
        );
        Ok(start_topic(window, message, reason))
    }

    /// Classify a whole stream, pulling one message at a time.
    ///
    /// Recoverable failures are logged and recorded in the report; fatal
    /// errors abort the run. At most `max_messages` messages are pulled.
    pub fn classify_stream<I>(
        &self,
        window: &mut Window,
        messages: I,
        max_messages: Option<usize>,
    ) -> Result<StreamReport, TopicsError>
    where
        I: IntoIterator<Item = Message>,
    {
        self.classify_stream_with(window, messages, max_messages, |_| {})
    }

    /// Like [`classify_stream`](Self::classify_stream), handing every
    /// evicted topic to `on_evict` before it is dropped.
    #[instrument(skip_all, fields(policy = self.config.policy.name(), capacity = ?window.capacity()))]
    pub fn classify_stream_with<I, F>(
        &self,
        window: &mut Window,
        messages: I,
        max_messages: Option<usize>,
        mut on_evict: F,
    ) -> Result<StreamReport, TopicsError>
    where
        I: IntoIterator<Item = Message>,
        F: FnMut(Topic),
    {
        let mut report = StreamReport::default();
        let mut messages = messages.into_iter();

        loop {
            if max_messages.is_some_and(|max| report.consumed >= max) {
                info!(max_messages = ?max_messages, "Message cap reached");
                break;
            }
            let Some(message) = messages.next() else {
                break;
            };
            report.consumed += 1;
            let message_id = message.id();

            match self.classify(window, message) {
                Ok(classification) => {
                    report.classified += 1;
                    if classification.decision == Decision::NewTopic {
                        report.new_topics += 1;
                    }
                    if let Some(evicted) = classification.evicted {
                        report.evicted += 1;
                        on_evict(evicted);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(message_id, error = %e, "Skipping message");
                    report.skipped.push(SkippedMessage {
                        message_id,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            consumed = report.consumed,
            classified = report.classified,
            skipped = report.skipped.len(),
            topics = window.len(),
            "Stream classified"
        );
        Ok(report)
    }
}

fn start_topic(window: &mut Window, message: Message, reason: String) -> Classification {
    let topic = Topic::new(message, reason.clone());
    let topic_id = topic.id().clone();
    let evicted = window.activate(topic);
    Classification {
        decision: Decision::NewTopic,
        topic_id,
        reason,
        evicted,
    }
}

fn format_scores(scores: &[f32]) -> String {
    let parts: Vec<String> = scores.iter().map(|s| format!("{:.3}", s)).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeDecayConfig;
    use chrono::{TimeZone, Utc};
    use threadline_embeddings::{CosineSimilarity, EmbeddingError, Representation};

    /// Reads the vector straight from the numbers in the text.
    struct ParsedRepr;

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

    fn classifier(config: ClassifierConfig) -> TopicClassifier {
        let scorer =
            SimilarityScorer::new(Arc::new(ParsedRepr), Arc::new(CosineSimilarity), None).unwrap();
        TopicClassifier::new(config, Arc::new(scorer)).unwrap()
    }

    fn msg(id: u64, text: &str) -> Message {
        Message::new(id, "alice", text)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let scorer =
            SimilarityScorer::new(Arc::new(ParsedRepr), Arc::new(CosineSimilarity), None).unwrap();
        let config = ClassifierConfig {
            max_active_topics: 0,
            ..Default::default()
        };
        assert!(TopicClassifier::new(config, Arc::new(scorer)).is_err());
    }

    #[test]
    fn test_first_message_reason() {
        let classifier = classifier(ClassifierConfig::default());
        let mut window = classifier.new_window();
        let result = classifier.classify(&mut window, msg(1, "1 0 0")).unwrap();
        assert_eq!(result.decision, Decision::NewTopic);
        assert_eq!(result.reason, "window empty");
    }

    #[test]
    fn test_elastic_accept_reason_records_inputs() {
        let classifier = classifier(ClassifierConfig::default());
        let mut window = classifier.new_window();
        classifier.classify(&mut window, msg(1, "1 0 0")).unwrap();
        let result = classifier.classify(&mut window, msg(2, "1 0 0")).unwrap();
        assert_eq!(result.decision, Decision::Similarity);
        assert_eq!(result.reason, "size 1 < 3: score 3 > 0.00, similarities [1.000]");
    }

    #[test]
    fn test_elastic_reject_reason_lists_scores() {
        let classifier = classifier(ClassifierConfig::default());
        let mut window = classifier.new_window();
        classifier.classify(&mut window, msg(1, "1 0 0")).unwrap();
        let result = classifier.classify(&mut window, msg(2, "0 1 0")).unwrap();
        assert_eq!(result.decision, Decision::NewTopic);
        assert_eq!(result.reason, "no similar topics, scores: [(size 1, score 0)]");
    }

    #[test]
    fn test_global_reason_strings() {
        let classifier = classifier(ClassifierConfig {
            policy: DecisionPolicy::GlobalThreshold(ThresholdConfig {
                similarity_threshold: 0.9,
            }),
            ..Default::default()
        });
        let mut window = classifier.new_window();
        classifier.classify(&mut window, msg(1, "1 0 0")).unwrap();

        let fallback = classifier.classify(&mut window, msg(2, "0 1 0")).unwrap();
        assert_eq!(fallback.decision, Decision::SingletonFallback);
        assert_eq!(fallback.reason, "previous topic with one element");

        let fresh = classifier.classify(&mut window, msg(3, "0 1 0")).unwrap();
        assert_eq!(fresh.decision, Decision::NewTopic);
        assert!(fresh.reason.starts_with("no similarity nor grammatically a reply"));
    }

    #[test]
    fn test_time_proximity_reason() {
        let classifier = classifier(ClassifierConfig {
            time_decay: Some(TimeDecayConfig { within_secs: 60 }),
            ..Default::default()
        });
        let mut window = classifier.new_window();
        let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_030, 0).unwrap();
        classifier
            .classify(&mut window, msg(1, "1 0 0").with_timestamp(t0))
            .unwrap();
        let result = classifier
            .classify(&mut window, msg(2, "0 1 0").with_timestamp(t1))
            .unwrap();
        assert_eq!(result.decision, Decision::TimeDecay);
        assert_eq!(result.reason, "within 60s of previous message (gap 30.0s)");
    }

    #[test]
    fn test_format_scores() {
        assert_eq!(format_scores(&[0.5, 1.0]), "[0.500, 1.000]");
        assert_eq!(format_scores(&[]), "[]");
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(Decision::SingletonFallback.to_string(), "singleton_fallback");
    }
}
