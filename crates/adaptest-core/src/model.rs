//! Core data model types for adaptest.
//!
//! Questions, assessment definitions, submitted answers, learning content and
//! the append-only records the host persists on the learner's behalf.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::AssessmentError;

/// Per-topic mastery in `[0, 1]`, in the order topics were first encountered.
pub type TopicProfile = IndexMap<String, f64>;

/// A single question in the question bank.
///
/// Questions are immutable once an attempt references them: re-grading a
/// historical attempt must reproduce its original result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier for this question.
    pub id: String,
    /// The text shown to the learner.
    #[serde(default)]
    pub stem: String,
    /// How the answer is checked.
    pub kind: QuestionKind,
    /// Ordered options for multiple-choice questions.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Answer key for numeric and short-text questions.
    #[serde(default)]
    pub answer_key: Option<AnswerKey>,
    /// Topic tags. Every question carries at least one.
    pub topics: Vec<String>,
    /// Difficulty from 1 (easiest) to 5.
    pub difficulty: u8,
}

impl Question {
    /// The first option flagged correct, if any.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// Supported question kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "mcq", alias = "multiple_choice")]
    MultipleChoice,
    #[serde(rename = "numeric")]
    Numeric,
    #[serde(rename = "short_text")]
    ShortText,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "mcq"),
            QuestionKind::Numeric => write!(f, "numeric"),
            QuestionKind::ShortText => write!(f, "short_text"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mcq" | "multiple_choice" | "multiple-choice" => Ok(QuestionKind::MultipleChoice),
            "numeric" => Ok(QuestionKind::Numeric),
            "short_text" | "short-text" | "text" => Ok(QuestionKind::ShortText),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// One option of a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Option identity submitted by the learner.
    pub id: String,
    /// Display text.
    #[serde(default)]
    pub text: String,
    /// Whether this is the correct option.
    #[serde(default)]
    pub is_correct: bool,
}

/// The answer key of a numeric or short-text question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKey {
    /// Compared numerically within a fixed tolerance.
    Number(f64),
    /// Compared as a case-insensitive string (or parsed, for numeric questions).
    Text(String),
    /// Regular expression matched against the lower-cased submission.
    Pattern(String),
}

/// One question reference in an assessment definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentItem {
    /// The referenced question.
    pub question_id: String,
    /// Score awarded when answered correctly, in `[0, 1]`.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Difficulty recorded at definition time.
    #[serde(default)]
    pub difficulty: Option<u8>,
}

fn default_weight() -> f64 {
    1.0
}

/// An assessment: an ordered list of weighted question references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentDefinition {
    /// Unique identifier for this assessment.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Grade bands this assessment applies to.
    #[serde(default)]
    pub grade_range: Vec<GradeBand>,
    /// The items, in presentation order.
    #[serde(default)]
    pub items: Vec<AssessmentItem>,
    /// Inactive assessments are never handed out.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl AssessmentDefinition {
    /// Whether this definition is active and covers `grade`.
    pub fn applies_to(&self, grade: GradeBand) -> bool {
        self.active && self.grade_range.contains(&grade)
    }
}

/// A raw answer value as submitted by the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Number(n) => write!(f, "{n}"),
            AnswerValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<f64> for AnswerValue {
    fn from(n: f64) -> Self {
        AnswerValue::Number(n)
    }
}

/// A learner's answer to one question. A missing value counts as unanswered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    #[serde(default)]
    pub answer: Option<AnswerValue>,
}

impl SubmittedAnswer {
    pub fn new(question_id: impl Into<String>, answer: impl Into<AnswerValue>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: Some(answer.into()),
        }
    }

    /// An entry for a question the learner left blank.
    pub fn blank(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: None,
        }
    }
}

/// The outcome of grading one answered assessment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedItem {
    pub question_id: String,
    pub correct: bool,
    /// The item weight if correct, else 0.
    pub score: f64,
    pub topics: Vec<String>,
}

/// A published (or draft) learning content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique identifier for this lesson.
    pub id: String,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Topic tags.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Difficulty from 1 to 5.
    pub difficulty: u8,
    /// Only published lessons are recommended.
    #[serde(default)]
    pub published: bool,
}

/// A grade band. Grades 6 through 12 plus the advanced final-year band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GradeBand {
    Grade(u8),
    Advanced,
}

/// Topics covered from grade 6 upward; each grade unlocks one more.
const CURRICULUM: [&str; 10] = [
    "kinematics",
    "forces",
    "energy",
    "waves",
    "electricity",
    "magnetism",
    "optics",
    "thermodynamics",
    "quantum",
    "relativity",
];

impl GradeBand {
    /// Build a numbered band, rejecting grades outside 6..=12.
    pub fn grade(n: u8) -> Result<Self, AssessmentError> {
        if (6..=12).contains(&n) {
            Ok(GradeBand::Grade(n))
        } else {
            Err(AssessmentError::UnknownGradeBand(n.to_string()))
        }
    }

    /// The topics a placement assessment for this band draws from.
    pub fn default_topics(&self) -> Vec<String> {
        let count = match self {
            GradeBand::Grade(n) if *n <= 6 => {
                return ["kinematics", "forces", "energy", "matter"]
                    .iter()
                    .map(|t| t.to_string())
                    .collect();
            }
            GradeBand::Grade(n) => (*n as usize - 2).min(CURRICULUM.len()),
            GradeBand::Advanced => CURRICULUM.len(),
        };
        CURRICULUM[..count].iter().map(|t| t.to_string()).collect()
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeBand::Grade(n) => write!(f, "{n}"),
            GradeBand::Advanced => write!(f, "EESH"),
        }
    }
}

impl FromStr for GradeBand {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "eesh" | "advanced" => Ok(GradeBand::Advanced),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(|n| GradeBand::grade(n).ok())
                .ok_or_else(|| AssessmentError::UnknownGradeBand(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for GradeBand {
    type Error = AssessmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GradeBand> for String {
    fn from(band: GradeBand) -> Self {
        band.to_string()
    }
}

/// Discrete proficiency level, ordered `L1 < L2 < ... < L5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    L1,
    L2,
    L3,
    L4,
    L5,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Level::L1 => 1,
            Level::L2 => 2,
            Level::L3 => 3,
            Level::L4 => 4,
            Level::L5 => 5,
        };
        write!(f, "L{n}")
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L1" => Ok(Level::L1),
            "L2" => Ok(Level::L2),
            "L3" => Ok(Level::L3),
            "L4" => Ok(Level::L4),
            "L5" => Ok(Level::L5),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Which kind of assessment produced a level record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    Placement,
    Retest,
}

impl fmt::Display for AssessmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentSource::Placement => write!(f, "placement"),
            AssessmentSource::Retest => write!(f, "retest"),
        }
    }
}

/// The scored outcome of one submission. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Assessment the attempt was scored against.
    pub assessment_id: String,
    /// `100 * sum(weights of correct items) / item count`.
    pub total_score_percent: f64,
    /// Per-topic mastery.
    pub topics_profile: TopicProfile,
    /// Topics with mastery below 0.5, in first-encountered order.
    pub weak_topics: Vec<String>,
    /// Level for the learner's grade band, when one was known.
    #[serde(default)]
    pub level_estimate: Option<Level>,
    /// Graded items in assessment order.
    #[serde(default)]
    pub items: Vec<GradedItem>,
}

/// One entry of a subject's append-only level history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelRecord {
    pub subject_id: String,
    pub source: AssessmentSource,
    pub level: Level,
    pub score_percent: f64,
    pub topics_profile: TopicProfile,
    #[serde(default)]
    pub weak_topics: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The current list of content suggested to a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub subject_id: String,
    pub computed_at: DateTime<Utc>,
    pub content_ids: Vec<String>,
    pub rationale: String,
}

/// The record with the latest `created_at`. Ties go to the later entry.
pub fn latest_record<'a, I>(records: I) -> Option<&'a LevelRecord>
where
    I: IntoIterator<Item = &'a LevelRecord>,
{
    records
        .into_iter()
        .fold(None, |best: Option<&LevelRecord>, r| match best {
            Some(b) if b.created_at > r.created_at => Some(b),
            _ => Some(r),
        })
}
