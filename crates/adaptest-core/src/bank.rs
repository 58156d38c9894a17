//! In-memory question bank and assessment lookup.

use indexmap::IndexMap;

use crate::error::AssessmentError;
use crate::model::{AssessmentDefinition, AssessmentItem, GradeBand, Question};
use crate::traits::QuestionSource;

/// Questions keyed by id, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: IndexMap<String, Question>,
}

impl QuestionBank {
    /// Build a bank. A later question with a duplicate id replaces the earlier one.
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: questions.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl QuestionSource for QuestionBank {
    fn question(&self, id: &str) -> Option<&Question> {
        self.questions.get(id)
    }

    fn questions(&self) -> Box<dyn Iterator<Item = &Question> + '_> {
        Box::new(self.questions.values())
    }
}

/// First active assessment whose grade range covers `grade`.
pub fn find_assessment(
    definitions: &[AssessmentDefinition],
    grade: GradeBand,
) -> Option<&AssessmentDefinition> {
    definitions.iter().find(|d| d.applies_to(grade))
}

/// Build a placement assessment for `grade` from the question bank.
///
/// Used when no stored definition covers the grade: takes the first `limit`
/// questions, in bank order, tagged with any of the grade's topics.
pub fn materialize_assessment<Q>(
    questions: &Q,
    grade: GradeBand,
    limit: usize,
) -> Result<AssessmentDefinition, AssessmentError>
where
    Q: QuestionSource + ?Sized,
{
    let topics = grade.default_topics();
    let items: Vec<AssessmentItem> = questions
        .questions()
        .filter(|q| q.topics.iter().any(|t| topics.contains(t)))
        .take(limit)
        .map(|q| AssessmentItem {
            question_id: q.id.clone(),
            weight: 1.0,
            difficulty: Some(q.difficulty),
        })
        .collect();

    if items.is_empty() {
        return Err(AssessmentError::InvalidInput(format!(
            "no questions available for a grade {grade} placement assessment"
        )));
    }

    tracing::info!(
        "materialized grade {grade} placement assessment with {} questions",
        items.len()
    );

    Ok(AssessmentDefinition {
        id: format!("placement-{grade}"),
        title: format!("Placement Test - Grade {grade}"),
        grade_range: vec![grade],
        items,
        active: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;

    fn question(id: &str, topic: &str, difficulty: u8) -> Question {
        Question {
            id: id.into(),
            stem: String::new(),
            kind: QuestionKind::ShortText,
            options: vec![],
            answer_key: None,
            topics: vec![topic.into()],
            difficulty,
        }
    }

    #[test]
    fn bank_lookup_and_order() {
        let bank = QuestionBank::new(vec![question("b", "forces", 1), question("a", "optics", 2)]);
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.question("a").unwrap().difficulty, 2);
        assert!(bank.question("zzz").is_none());
        let ids: Vec<&str> = bank.questions().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn materialize_filters_by_grade_topics() {
        let bank = QuestionBank::new(vec![
            question("q1", "relativity", 5),
            question("q2", "forces", 2),
            question("q3", "matter", 1),
            question("q4", "energy", 3),
        ]);
        let def = materialize_assessment(&bank, GradeBand::Grade(7), 20).unwrap();
        let ids: Vec<&str> = def.items.iter().map(|i| i.question_id.as_str()).collect();
        assert_eq!(ids, vec!["q2", "q4"]);
        assert_eq!(def.items[1].difficulty, Some(3));
        assert!(def.applies_to(GradeBand::Grade(7)));

        let capped = materialize_assessment(&bank, GradeBand::Advanced, 1).unwrap();
        assert_eq!(capped.items.len(), 1);
        assert_eq!(capped.items[0].question_id, "q1");
    }

    #[test]
    fn materialize_without_questions_fails() {
        let bank = QuestionBank::new(vec![question("q1", "relativity", 5)]);
        let err = materialize_assessment(&bank, GradeBand::Grade(6), 20).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn find_assessment_skips_inactive() {
        let mut inactive = materialize_assessment(
            &QuestionBank::new(vec![question("q1", "forces", 1)]),
            GradeBand::Grade(9),
            5,
        )
        .unwrap();
        inactive.active = false;
        let mut active = inactive.clone();
        active.id = "live".into();
        active.active = true;

        let defs = vec![inactive, active];
        assert_eq!(find_assessment(&defs, GradeBand::Grade(9)).unwrap().id, "live");
        assert!(find_assessment(&defs, GradeBand::Grade(10)).is_none());
    }
}
