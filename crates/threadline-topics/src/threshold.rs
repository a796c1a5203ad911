//! Elastic acceptance thresholds.
//!
//! A candidate topic accepts a message when its score is strictly greater
//! than a bar that grows with the topic's size:
//!
//! | size      | bar                     |
//! |-----------|-------------------------|
//! | < 3       | 0                       |
//! | [3, 10)   | size - (2 - size / 15)  |
//! | >= 10     | 1.5 * size              |
//!
//! Large topics need more evidence, since the odds of a casual match grow
//! with every message they hold.

use std::fmt;

use crate::config::ElasticConfig;

/// Size band of a candidate topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElasticBranch {
    /// Fewer than 3 messages
    Nascent,
    /// 3 to 9 messages
    Growing,
    /// 10 or more messages
    Established,
}

impl ElasticBranch {
    pub fn for_size(size: usize) -> Self {
        if size < 3 {
            ElasticBranch::Nascent
        } else if size < 10 {
            ElasticBranch::Growing
        } else {
            ElasticBranch::Established
        }
    }
}

impl fmt::Display for ElasticBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElasticBranch::Nascent => write!(f, "< 3"),
            ElasticBranch::Growing => write!(f, "< 10"),
            ElasticBranch::Established => write!(f, ">= 10"),
        }
    }
}

/// Score a topic of `size` messages must exceed to accept a message.
pub fn elastic_threshold(size: usize) -> f32 {
    let s = size as f32;
    match ElasticBranch::for_size(size) {
        ElasticBranch::Nascent => 0.0,
        ElasticBranch::Growing => s - (2.0 - s / 15.0),
        ElasticBranch::Established => 1.5 * s,
    }
}

/// Whether `score` clears the bar for a topic of `size` (strictly greater).
pub fn elastic_accepts(size: usize, score: f32) -> bool {
    score > elastic_threshold(size)
}

/// Per-message similarity bands for one sweep, walked upward after every
/// rejected candidate so older topics are harder to match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepThresholds {
    pub low: f32,
    pub high: f32,
    low_step: f32,
    high_step: f32,
}

impl SweepThresholds {
    pub fn new(config: &ElasticConfig) -> Self {
        Self {
            low: config.low_threshold,
            high: config.high_threshold,
            low_step: config.low_step,
            high_step: config.high_step,
        }
    }

    /// Points for one message similarity: 0 below `low`, 1 below `high`,
    /// 3 otherwise.
    pub fn points(&self, similarity: f32) -> u32 {
        if similarity < self.low {
            0
        } else if similarity < self.high {
            1
        } else {
            3
        }
    }

    /// Aggregate score of a topic from its per-message similarities.
    pub fn score(&self, similarities: &[f32]) -> u32 {
        similarities.iter().map(|&s| self.points(s)).sum()
    }

    /// Tighten both bands for the next (older) candidate.
    ///
    /// `low` moves by `low_step` while that keeps it under `high`, otherwise
    /// by `high_step`, so it never overtakes `high`.
    pub fn advance(&mut self) {
        self.low += if self.low + self.low_step < self.high {
            self.low_step
        } else {
            self.high_step
        };
        self.high += self.high_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_boundaries() {
        assert_eq!(ElasticBranch::for_size(1), ElasticBranch::Nascent);
        assert_eq!(ElasticBranch::for_size(2), ElasticBranch::Nascent);
        assert_eq!(ElasticBranch::for_size(3), ElasticBranch::Growing);
        assert_eq!(ElasticBranch::for_size(9), ElasticBranch::Growing);
        assert_eq!(ElasticBranch::for_size(10), ElasticBranch::Established);
    }

    #[test]
    fn test_threshold_values() {
        assert!(elastic_threshold(2).abs() < f32::EPSILON);
        assert!((elastic_threshold(3) - 1.2).abs() < 1e-5);
        assert!((elastic_threshold(9) - 7.6).abs() < 1e-5);
        assert!((elastic_threshold(10) - 15.0).abs() < 1e-5);
        assert!((elastic_threshold(15) - 22.5).abs() < 1e-5);
    }

    #[test]
    fn test_nascent_accepts_any_positive_score() {
        assert!(elastic_accepts(1, 1.0));
        assert!(!elastic_accepts(1, 0.0));
    }

    #[test]
    fn test_large_topic_needs_higher_score() {
        // Same score: accepted by a size-2 topic, rejected by a size-12 one
        for score in [1.0f32, 5.0, 18.0] {
            assert!(elastic_accepts(2, score));
            assert!(!elastic_accepts(12, score));
        }
        assert!(elastic_threshold(12) > elastic_threshold(2));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(!elastic_accepts(15, 22.5));
        assert!(elastic_accepts(15, 23.0));
    }

    #[test]
    fn test_points_bands() {
        let t = SweepThresholds::new(&ElasticConfig::default());
        assert_eq!(t.points(0.39), 0);
        assert_eq!(t.points(0.4), 1);
        assert_eq!(t.points(0.69), 1);
        assert_eq!(t.points(0.7), 3);
        assert_eq!(t.score(&[0.1, 0.5, 0.9]), 4);
    }

    #[test]
    fn test_advance_walks_up() {
        let mut t = SweepThresholds::new(&ElasticConfig::default());
        t.advance();
        assert!((t.low - 0.45).abs() < 1e-5);
        assert!((t.high - 0.72).abs() < 1e-5);
    }

    #[test]
    fn test_advance_low_never_overtakes_high() {
        let mut t = SweepThresholds::new(&ElasticConfig {
            low_threshold: 0.68,
            high_threshold: 0.7,
            low_step: 0.05,
            high_step: 0.02,
        });
        for _ in 0..10 {
            t.advance();
            assert!(t.low <= t.high + 1e-5);
        }
    }

    #[test]
    fn test_branch_display() {
        assert_eq!(ElasticBranch::Growing.to_string(), "< 10");
    }
}
