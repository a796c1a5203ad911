//! # threadline-topics
//!
//! Online segmentation of a chronological chat stream into topics.
//!
//! Messages are classified one at a time, in arrival order, against a
//! bounded recency-ordered [`Window`] of active topics. Each message either
//! continues an existing topic (as a grammatical reply, by time proximity, or
//! by similarity) or starts a new one. Past decisions are never revisited.
//!
//! ## Features
//! - LRU-style window with promotion and eviction of the stalest topic
//! - Centroid and per-message similarity scoring over pluggable
//!   representation and similarity capabilities
//! - Elastic, size-dependent acceptance thresholds with recency bias
//! - Alternate single global similarity threshold policy
//! - Optional grammatical reply detection and time-proximity short-circuit
//!
//! ## Usage
//!
//! ```rust,ignore
//! let scorer = Arc::new(SimilarityScorer::new(repr, Arc::new(CosineSimilarity), None)?);
//! let classifier = TopicClassifier::new(ClassifierConfig::default(), scorer)?;
//! let mut window = classifier.new_window();
//! let report = classifier.classify_stream(&mut window, messages, None)?;
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod reply;
pub mod scorer;
pub mod similarity;
pub mod threshold;
pub mod types;
pub mod window;

pub use classifier::{Classification, Decision, SkippedMessage, StreamReport, TopicClassifier};
pub use config::{ClassifierConfig, DecisionPolicy, ElasticConfig, ThresholdConfig, TimeDecayConfig};
pub use error::TopicsError;
pub use reply::{GrammarReplyDetector, ReplyDetector, ReplyVerdict};
pub use scorer::SimilarityScorer;
pub use similarity::calculate_centroid;
pub use threshold::{elastic_accepts, elastic_threshold, ElasticBranch, SweepThresholds};
pub use types::{Topic, TopicEntry, TopicId};
pub use window::Window;
