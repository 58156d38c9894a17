//! Answer grading.
//!
//! Compares one submitted answer to one question's answer key. Grading is
//! total: every malformed case resolves to "incorrect".

use regex::Regex;

use crate::model::{AnswerKey, AnswerValue, Question, QuestionKind};

/// Maximum absolute difference accepted for numeric answers.
pub const NUMERIC_TOLERANCE: f64 = 0.01;

/// Slack for binary floating point, so a difference of exactly 0.01 passes.
const FLOAT_SLACK: f64 = 1e-9;

/// Grade one answer. `None` means the learner left the question blank.
pub fn grade_answer(question: &Question, answer: Option<&AnswerValue>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match question.kind {
        QuestionKind::MultipleChoice => grade_choice(question, answer),
        QuestionKind::Numeric => grade_numeric(question, answer),
        QuestionKind::ShortText => grade_text(question, answer),
    }
}

fn grade_choice(question: &Question, answer: &AnswerValue) -> bool {
    match question.correct_option() {
        Some(option) => option.id == answer.to_string(),
        None => {
            tracing::warn!("question '{}' has no correct option", question.id);
            false
        }
    }
}

fn grade_numeric(question: &Question, answer: &AnswerValue) -> bool {
    let key = match &question.answer_key {
        Some(AnswerKey::Number(n)) => Some(*n),
        Some(AnswerKey::Text(s)) => parse_number(s),
        Some(AnswerKey::Pattern(_)) | None => None,
    };
    let Some(key) = key else {
        tracing::warn!("question '{}' has no numeric answer key", question.id);
        return false;
    };

    let submitted = match answer {
        AnswerValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        AnswerValue::Text(s) => parse_number(s),
    };

    submitted.is_some_and(|n| (n - key).abs() <= NUMERIC_TOLERANCE + FLOAT_SLACK)
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn grade_text(question: &Question, answer: &AnswerValue) -> bool {
    let submitted = answer.to_string().to_lowercase();
    match &question.answer_key {
        Some(AnswerKey::Pattern(pattern)) => match Regex::new(pattern) {
            Ok(re) => re.is_match(&submitted),
            Err(e) => {
                tracing::warn!("question '{}' has an invalid pattern: {e}", question.id);
                false
            }
        },
        Some(AnswerKey::Text(key)) => submitted == key.to_lowercase(),
        Some(AnswerKey::Number(n)) => submitted == n.to_string(),
        None => {
            tracing::warn!("question '{}' has no answer key", question.id);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn question(kind: QuestionKind, key: Option<AnswerKey>) -> Question {
        Question {
            id: "q".into(),
            stem: String::new(),
            kind,
            options: vec![],
            answer_key: key,
            topics: vec!["forces".into()],
            difficulty: 2,
        }
    }

    fn mcq() -> Question {
        let mut q = question(QuestionKind::MultipleChoice, None);
        q.options = vec![
            AnswerOption {
                id: "a".into(),
                text: "3 N".into(),
                is_correct: false,
            },
            AnswerOption {
                id: "b".into(),
                text: "6 N".into(),
                is_correct: true,
            },
        ];
        q
    }

    #[test]
    fn multiple_choice_matches_correct_option_id() {
        let q = mcq();
        assert!(grade_answer(&q, Some(&"b".into())));
        assert!(!grade_answer(&q, Some(&"a".into())));
        assert!(!grade_answer(&q, Some(&"z".into())));
        assert!(!grade_answer(&q, None));
    }

    #[test]
    fn multiple_choice_numeric_option_ids() {
        let mut q = mcq();
        q.options[1].id = "2".into();
        assert!(grade_answer(&q, Some(&AnswerValue::Number(2.0))));
    }

    #[test]
    fn multiple_choice_without_correct_option_is_incorrect() {
        let mut q = mcq();
        q.options[1].is_correct = false;
        assert!(!grade_answer(&q, Some(&"b".into())));
    }

    #[test]
    fn numeric_tolerance_boundary() {
        let q = question(QuestionKind::Numeric, Some(AnswerKey::Number(1.0)));
        assert!(grade_answer(&q, Some(&AnswerValue::Number(1.0))));
        assert!(grade_answer(&q, Some(&AnswerValue::Number(1.01))));
        assert!(grade_answer(&q, Some(&AnswerValue::Number(0.99))));
        assert!(!grade_answer(&q, Some(&AnswerValue::Number(1.0100001))));
        assert!(!grade_answer(&q, Some(&AnswerValue::Number(0.9899999))));
    }

    #[test]
    fn numeric_parses_text_submissions_and_keys() {
        let q = question(QuestionKind::Numeric, Some(AnswerKey::Text("9.8".into())));
        assert!(grade_answer(&q, Some(&" 9.81 ".into())));
        assert!(!grade_answer(&q, Some(&"nine point eight".into())));
        assert!(!grade_answer(&q, Some(&"".into())));
        assert!(!grade_answer(&q, Some(&"NaN".into())));
        assert!(!grade_answer(&q, Some(&AnswerValue::Number(f64::INFINITY))));
    }

    #[test]
    fn numeric_with_unusable_key_is_incorrect() {
        let q = question(QuestionKind::Numeric, Some(AnswerKey::Text("lots".into())));
        assert!(!grade_answer(&q, Some(&AnswerValue::Number(1.0))));
        let q = question(QuestionKind::Numeric, None);
        assert!(!grade_answer(&q, Some(&AnswerValue::Number(1.0))));
    }

    #[test]
    fn short_text_is_case_insensitive() {
        let q = question(QuestionKind::ShortText, Some(AnswerKey::Text("Newton".into())));
        assert!(grade_answer(&q, Some(&"NEWTON".into())));
        assert!(grade_answer(&q, Some(&"newton".into())));
        assert!(!grade_answer(&q, Some(&"newtons".into())));
    }

    #[test]
    fn short_text_pattern_matches_lowercased_submission() {
        let q = question(
            QuestionKind::ShortText,
            Some(AnswerKey::Pattern("^(joule|j)s?$".into())),
        );
        assert!(grade_answer(&q, Some(&"Joules".into())));
        assert!(grade_answer(&q, Some(&"J".into())));
        assert!(!grade_answer(&q, Some(&"watt".into())));
    }

    #[test]
    fn short_text_invalid_pattern_is_incorrect() {
        let q = question(QuestionKind::ShortText, Some(AnswerKey::Pattern("(".into())));
        assert!(!grade_answer(&q, Some(&"(".into())));
    }
}
