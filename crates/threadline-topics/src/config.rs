//! Classifier configuration.

use serde::{Deserialize, Serialize};

use crate::error::TopicsError;

/// Master configuration for the topic classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Maximum topics kept in the window; `None` = unbounded
    #[serde(default)]
    pub window_capacity: Option<usize>,

    /// How many of the most recent topics a message is compared against
    #[serde(default = "default_max_active_topics")]
    pub max_active_topics: usize,

    /// Similarity decision procedure
    #[serde(default)]
    pub policy: DecisionPolicy,

    /// Time-proximity short-circuit; disabled when absent
    #[serde(default)]
    pub time_decay: Option<TimeDecayConfig>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_capacity: None,
            max_active_topics: default_max_active_topics(),
            policy: DecisionPolicy::default(),
            time_decay: None,
        }
    }
}

fn default_max_active_topics() -> usize {
    5
}

impl ClassifierConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), TopicsError> {
        if self.window_capacity == Some(0) {
            return Err(TopicsError::InvalidConfig(
                "window_capacity must be >= 1 when set".to_string(),
            ));
        }
        if self.max_active_topics == 0 {
            return Err(TopicsError::InvalidConfig(
                "max_active_topics must be >= 1".to_string(),
            ));
        }
        self.policy.validate()?;
        if let Some(decay) = &self.time_decay {
            decay.validate()?;
        }
        Ok(())
    }
}

/// How a message is matched to an existing topic by similarity.
///
/// The two procedures are alternatives; one classifier uses exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionPolicy {
    /// First-fit sweep over recent topics with size-dependent thresholds
    Elastic(ElasticConfig),
    /// Best centroid similarity against one global threshold
    GlobalThreshold(ThresholdConfig),
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy::Elastic(ElasticConfig::default())
    }
}

impl DecisionPolicy {
    pub fn validate(&self) -> Result<(), TopicsError> {
        match self {
            DecisionPolicy::Elastic(cfg) => cfg.validate(),
            DecisionPolicy::GlobalThreshold(cfg) => cfg.validate(),
        }
    }

    /// Short name for logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            DecisionPolicy::Elastic(_) => "elastic",
            DecisionPolicy::GlobalThreshold(_) => "global_threshold",
        }
    }
}

/// Elastic sweep settings.
///
/// Each message of a candidate topic scores 0 points below `low_threshold`,
/// 1 point below `high_threshold` and 3 points otherwise. Both thresholds
/// step up after every rejected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticConfig {
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f32,

    #[serde(default = "default_high_threshold")]
    pub high_threshold: f32,

    #[serde(default = "default_low_step")]
    pub low_step: f32,

    #[serde(default = "default_high_step")]
    pub high_step: f32,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            high_threshold: default_high_threshold(),
            low_step: default_low_step(),
            high_step: default_high_step(),
        }
    }
}

fn default_low_threshold() -> f32 {
    0.4
}
fn default_high_threshold() -> f32 {
    0.7
}
fn default_low_step() -> f32 {
    0.05
}
fn default_high_step() -> f32 {
    0.02
}

impl ElasticConfig {
    pub fn validate(&self) -> Result<(), TopicsError> {
        for (name, value) in [
            ("low_threshold", self.low_threshold),
            ("high_threshold", self.high_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TopicsError::InvalidConfig(format!(
                    "{} must be 0.0-1.0, got {}",
                    name, value
                )));
            }
        }
        if self.low_threshold > self.high_threshold {
            return Err(TopicsError::InvalidConfig(format!(
                "low_threshold ({}) must not exceed high_threshold ({})",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.low_step < 0.0 || self.high_step < 0.0 {
            return Err(TopicsError::InvalidConfig(
                "threshold steps must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global threshold settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum centroid similarity to join an existing topic
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.75
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<(), TopicsError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(TopicsError::InvalidConfig(format!(
                "similarity_threshold must be 0.0-1.0, got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

/// Time-proximity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDecayConfig {
    /// Messages closer than this to the latest activity join the current topic
    pub within_secs: u64,
}

impl TimeDecayConfig {
    pub fn validate(&self) -> Result<(), TopicsError> {
        if self.within_secs == 0 {
            return Err(TopicsError::InvalidConfig(
                "time_decay.within_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
