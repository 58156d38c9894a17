//! Topic tallies, mastery profiles, and weak-topic detection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::TopicProfile;

/// Topics with mastery strictly below this value are weak.
pub const WEAK_TOPIC_THRESHOLD: f64 = 0.5;

/// Correct/total answer counts for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTally {
    pub correct: u32,
    pub total: u32,
}

impl TopicTally {
    pub fn new(correct: u32, total: u32) -> Self {
        Self { correct, total }
    }

    pub fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }

    /// `clamp(correct / max(total, 1), 0, 1)`.
    pub fn mastery(&self) -> f64 {
        (self.correct as f64 / self.total.max(1) as f64).clamp(0.0, 1.0)
    }
}

/// Tallies keyed by topic, in first-encountered order.
pub type TopicTallies = IndexMap<String, TopicTally>;

/// Convert per-topic tallies into a normalized mastery profile.
pub fn build_topic_profile(tallies: &TopicTallies) -> TopicProfile {
    tallies
        .iter()
        .map(|(topic, tally)| (topic.clone(), tally.mastery()))
        .collect()
}

pub fn is_weak(mastery: f64) -> bool {
    mastery < WEAK_TOPIC_THRESHOLD
}

/// Weak topics of a mastery profile, preserving profile order.
///
/// This is the single weak-topic computation: attempt scoring, session
/// storage and level records all go through it.
pub fn weak_topics(profile: &TopicProfile) -> Vec<String> {
    profile
        .iter()
        .filter(|(_, &mastery)| is_weak(mastery))
        .map(|(topic, _)| topic.clone())
        .collect()
}
