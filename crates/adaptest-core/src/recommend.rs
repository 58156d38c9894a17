//! Recommendation selection.
//!
//! Picks a bounded, reproducible list of lessons: first lessons on the
//! learner's weak topics, then general lessons, both gated by the learner's
//! difficulty band and both in catalog order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::level::DifficultyBand;
use crate::model::{Lesson, Level, TopicProfile};

/// Default number of recommended lessons.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 6;

/// Inputs to a selection run.
#[derive(Debug, Clone)]
pub struct RecommendationRequest<'a> {
    /// Maximum number of lessons to return.
    pub count: usize,
    /// The learner's current level.
    pub level: Level,
    /// Mastery per topic, used to annotate the rationale.
    pub topics_profile: &'a TopicProfile,
    /// Topics driving the targeted pass.
    pub weak_topics: &'a [String],
}

/// The chosen lessons and a human-readable rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub content_ids: Vec<String>,
    /// How many of `content_ids` came from the weak-topic pass.
    pub targeted: usize,
    pub rationale: String,
}

/// Select up to `request.count` lessons from `catalog`.
///
/// Deterministic for identical inputs; never returns duplicates. An empty
/// catalog yields an empty selection.
pub fn select_recommendations(request: &RecommendationRequest<'_>, catalog: &[Lesson]) -> Selection {
    let band = DifficultyBand::for_level(request.level);
    let weak: HashSet<&str> = request.weak_topics.iter().map(String::as_str).collect();

    let mut picker = Picker::new(request.count, band);
    picker.take(catalog, |lesson| {
        lesson.topics.iter().any(|t| weak.contains(t.as_str()))
    });
    let targeted = picker.chosen.len();

    if targeted < request.count {
        tracing::debug!(
            "only {targeted} targeted lessons for {}, filling up to {}",
            request.level,
            request.count
        );
        picker.take(catalog, |_| true);
    }

    Selection {
        content_ids: picker.chosen,
        targeted,
        rationale: rationale(request),
    }
}

/// Selection for a learner with no level record yet: general lessons at the
/// starter difficulty band.
pub fn select_starter(count: usize, catalog: &[Lesson]) -> Selection {
    let mut picker = Picker::new(count, DifficultyBand::STARTER);
    picker.take(catalog, |_| true);
    Selection {
        content_ids: picker.chosen,
        targeted: 0,
        rationale: format!(
            "No assessment yet, starter lessons at difficulty {}-{}",
            DifficultyBand::STARTER.min,
            DifficultyBand::STARTER.max
        ),
    }
}

struct Picker<'c> {
    count: usize,
    band: DifficultyBand,
    seen: HashSet<&'c str>,
    chosen: Vec<String>,
}

impl<'c> Picker<'c> {
    fn new(count: usize, band: DifficultyBand) -> Self {
        Self {
            count,
            band,
            seen: HashSet::new(),
            chosen: Vec::new(),
        }
    }

    fn take(&mut self, catalog: &'c [Lesson], wanted: impl Fn(&Lesson) -> bool) {
        for lesson in catalog {
            if self.chosen.len() >= self.count {
                break;
            }
            if !lesson.published || !self.band.contains(lesson.difficulty) || !wanted(lesson) {
                continue;
            }
            if self.seen.insert(lesson.id.as_str()) {
                self.chosen.push(lesson.id.clone());
            }
        }
    }
}

fn rationale(request: &RecommendationRequest<'_>) -> String {
    if request.weak_topics.is_empty() {
        return format!("Level: {}, no weak topics", request.level);
    }
    let topics: Vec<String> = request
        .weak_topics
        .iter()
        .map(|topic| match request.topics_profile.get(topic) {
            Some(mastery) => format!("{topic} ({:.0}%)", mastery * 100.0),
            None => topic.clone(),
        })
        .collect();
    format!("Level: {}, Weak topics: {}", request.level, topics.join(", "))
}
