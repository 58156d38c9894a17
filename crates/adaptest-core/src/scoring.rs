//! Attempt scoring.
//!
//! Grades every answered item of an assessment and aggregates the total
//! score and per-topic tallies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;
use crate::grader::grade_answer;
use crate::model::{AssessmentDefinition, AttemptResult, GradedItem, Level, SubmittedAnswer, TopicProfile};
use crate::profile::{build_topic_profile, weak_topics, TopicTallies};
use crate::traits::QuestionSource;

/// Aggregated outcome of grading one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptScore {
    pub assessment_id: String,
    /// `100 * sum(weights of correct items) / item count`.
    pub score_percent: f64,
    /// Per-topic counters. A question with N topics feeds N counters.
    pub tallies: TopicTallies,
    /// Graded items in assessment order. Unanswered items are absent.
    pub items: Vec<GradedItem>,
}

impl AttemptScore {
    pub fn topics_profile(&self) -> TopicProfile {
        build_topic_profile(&self.tallies)
    }

    /// Freeze into an immutable attempt result.
    pub fn into_result(self, level_estimate: Option<Level>) -> AttemptResult {
        let topics_profile = self.topics_profile();
        let weak_topics = weak_topics(&topics_profile);
        AttemptResult {
            assessment_id: self.assessment_id,
            total_score_percent: self.score_percent,
            topics_profile,
            weak_topics,
            level_estimate,
            items: self.items,
        }
    }
}

/// Score a submission against an assessment definition.
///
/// Only items with a submitted answer are graded and tallied, but the
/// percentage is taken over all items, so skipped items count as zero.
/// When a question id is answered more than once the first answer counts.
pub fn score_attempt<Q>(
    definition: &AssessmentDefinition,
    questions: &Q,
    answers: &[SubmittedAnswer],
) -> Result<AttemptScore, AssessmentError>
where
    Q: QuestionSource + ?Sized,
{
    if definition.items.is_empty() {
        return Err(AssessmentError::EmptyAssessment(definition.id.clone()));
    }

    let mut by_question: HashMap<&str, &SubmittedAnswer> = HashMap::new();
    for answer in answers {
        by_question.entry(answer.question_id.as_str()).or_insert(answer);
    }

    let mut total_score = 0.0;
    let mut tallies = TopicTallies::new();
    let mut items = Vec::new();

    for item in &definition.items {
        let Some(answer) = by_question.get(item.question_id.as_str()) else {
            continue;
        };
        let Some(question) = questions.question(&item.question_id) else {
            tracing::warn!(
                "assessment '{}' references unknown question '{}', scoring it as zero",
                definition.id,
                item.question_id
            );
            continue;
        };

        let correct = grade_answer(question, answer.answer.as_ref());
        let score = if correct { item_weight(item.weight) } else { 0.0 };
        total_score += score;

        for topic in &question.topics {
            tallies.entry(topic.clone()).or_default().record(correct);
        }

        items.push(GradedItem {
            question_id: question.id.clone(),
            correct,
            score,
            topics: question.topics.clone(),
        });
    }

    let score_percent = 100.0 * total_score / definition.items.len() as f64;
    tracing::debug!(
        "scored '{}': {}/{} answered, {score_percent:.1}%",
        definition.id,
        items.len(),
        definition.items.len()
    );

    Ok(AttemptScore {
        assessment_id: definition.id.clone(),
        score_percent,
        tallies,
        items,
    })
}

fn item_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use crate::model::{AnswerKey, AssessmentItem, Question, QuestionKind};

    fn numeric(id: &str, key: f64, topics: &[&str]) -> Question {
        Question {
            id: id.into(),
            stem: String::new(),
            kind: QuestionKind::Numeric,
            options: vec![],
            answer_key: Some(AnswerKey::Number(key)),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            difficulty: 2,
        }
    }

    fn definition(items: &[(&str, f64)]) -> AssessmentDefinition {
        AssessmentDefinition {
            id: "placement".into(),
            title: String::new(),
            grade_range: vec![],
            items: items
                .iter()
                .map(|(id, w)| AssessmentItem {
                    question_id: id.to_string(),
                    weight: *w,
                    difficulty: None,
                })
                .collect(),
            active: true,
        }
    }

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            numeric("q1", 1.0, &["kinematics"]),
            numeric("q2", 2.0, &["kinematics", "forces"]),
            numeric("q3", 3.0, &["forces"]),
            numeric("q4", 4.0, &["energy"]),
        ])
    }

    #[test]
    fn empty_assessment_is_rejected() {
        let err = score_attempt(&definition(&[]), &bank(), &[]).unwrap_err();
        assert_eq!(err, AssessmentError::EmptyAssessment("placement".into()));
    }

    #[test]
    fn percent_is_over_all_items() {
        let def = definition(&[("q1", 1.0), ("q2", 1.0), ("q3", 1.0), ("q4", 1.0)]);
        let answers = vec![
            SubmittedAnswer::new("q1", 1.0),
            SubmittedAnswer::new("q2", 5.0),
            SubmittedAnswer::new("q3", 3.0),
        ];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        assert!((score.score_percent - 50.0).abs() < 1e-9);
        assert_eq!(score.items.len(), 3);
        assert!(!score.tallies.contains_key("energy"));
    }

    #[test]
    fn weights_scale_the_score() {
        let def = definition(&[("q1", 0.5), ("q2", 1.0)]);
        let answers = vec![SubmittedAnswer::new("q1", 1.0), SubmittedAnswer::new("q2", 0.0)];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        assert!((score.score_percent - 25.0).abs() < 1e-9);
        assert_eq!(score.items[0].score, 0.5);
        assert_eq!(score.items[1].score, 0.0);
    }

    #[test]
    fn multi_topic_questions_feed_every_counter() {
        let def = definition(&[("q1", 1.0), ("q2", 1.0), ("q3", 1.0)]);
        let answers = vec![
            SubmittedAnswer::new("q1", 0.0),
            SubmittedAnswer::new("q2", 2.0),
            SubmittedAnswer::new("q3", 0.0),
        ];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        assert_eq!(score.tallies["kinematics"].total, 2);
        assert_eq!(score.tallies["kinematics"].correct, 1);
        assert_eq!(score.tallies["forces"].total, 2);
        assert_eq!(
            score.tallies.keys().collect::<Vec<_>>(),
            vec!["kinematics", "forces"]
        );
    }

    #[test]
    fn answer_order_does_not_matter() {
        let def = definition(&[("q1", 0.3), ("q2", 0.7), ("q3", 1.0), ("q4", 0.1)]);
        let mut answers = vec![
            SubmittedAnswer::new("q1", 1.0),
            SubmittedAnswer::new("q2", 2.0),
            SubmittedAnswer::new("q3", 9.0),
            SubmittedAnswer::new("q4", 4.0),
        ];
        let forward = score_attempt(&def, &bank(), &answers).unwrap();
        answers.reverse();
        let backward = score_attempt(&def, &bank(), &answers).unwrap();
        assert_eq!(forward.score_percent, backward.score_percent);
        assert_eq!(forward.items, backward.items);
    }

    #[test]
    fn blank_and_foreign_answers() {
        let def = definition(&[("q1", 1.0), ("q2", 1.0)]);
        let answers = vec![
            SubmittedAnswer::blank("q1"),
            SubmittedAnswer::new("q9", 1.0),
            SubmittedAnswer::new("q2", 2.0),
            SubmittedAnswer::new("q2", 7.0),
        ];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        assert!((score.score_percent - 50.0).abs() < 1e-9);
        assert!(!score.items[0].correct);
        assert!(score.items[1].correct);
        assert_eq!(score.tallies["kinematics"].total, 2);
    }

    #[test]
    fn unknown_questions_score_zero() {
        let def = definition(&[("q1", 1.0), ("missing", 1.0)]);
        let answers = vec![SubmittedAnswer::new("q1", 1.0), SubmittedAnswer::new("missing", 1.0)];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        assert!((score.score_percent - 50.0).abs() < 1e-9);
        assert_eq!(score.items.len(), 1);
    }

    #[test]
    fn into_result_carries_profile_and_weak_topics() {
        let def = definition(&[("q1", 1.0), ("q3", 1.0), ("q4", 1.0)]);
        let answers = vec![
            SubmittedAnswer::new("q1", 0.0),
            SubmittedAnswer::new("q3", 3.0),
            SubmittedAnswer::new("q4", 4.0),
        ];
        let score = score_attempt(&def, &bank(), &answers).unwrap();
        let profile = score.topics_profile();
        let result = score.into_result(Some(Level::L2));
        assert_eq!(result.topics_profile, profile);
        assert_eq!(result.weak_topics, vec!["kinematics"]);
        assert_eq!(result.topics_profile["forces"], 1.0);
        assert_eq!(result.level_estimate, Some(Level::L2));
    }
}
