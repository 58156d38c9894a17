//! TOML question bank parser.
//!
//! Loads question banks from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::bank::QuestionBank;
use crate::model::{AnswerKey, AssessmentDefinition, Lesson, Question, QuestionKind};

/// A parsed question bank file.
#[derive(Debug, Clone)]
pub struct BankFile {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Questions as written, duplicates included.
    pub questions: Vec<Question>,
    pub assessments: Vec<AssessmentDefinition>,
    pub lessons: Vec<Lesson>,
}

impl BankFile {
    /// Index the questions for lookup. Later duplicates win.
    pub fn question_bank(&self) -> QuestionBank {
        QuestionBank::new(self.questions.iter().cloned())
    }

    /// Lessons that may be recommended.
    pub fn published_lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.lessons.iter().filter(|l| l.published)
    }
}

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<Question>,
    #[serde(default)]
    assessments: Vec<AssessmentDefinition>,
    #[serde(default)]
    lessons: Vec<Lesson>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a single TOML file into a `BankFile`.
pub fn parse_bank(path: &Path) -> Result<BankFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into a `BankFile`.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<BankFile> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(BankFile {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        questions: parsed.questions,
        assessments: parsed.assessments,
        lessons: parsed.lessons,
    })
}

/// Recursively load all `.toml` bank files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<BankFile>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    paths.sort();

    for path in paths {
        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question, lesson or assessment ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            message: message.into(),
        }
    }
}

/// Validate a bank for content that would grade or recommend badly.
pub fn validate_bank(bank: &BankFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_questions = HashSet::new();
    for question in &bank.questions {
        if !seen_questions.insert(question.id.as_str()) {
            warnings.push(ValidationWarning::new(
                &question.id,
                format!("duplicate question ID: {}", question.id),
            ));
        }
        validate_question(question, &mut warnings);
    }

    let mut seen_lessons = HashSet::new();
    for lesson in &bank.lessons {
        if !seen_lessons.insert(lesson.id.as_str()) {
            warnings.push(ValidationWarning::new(
                &lesson.id,
                format!("duplicate lesson ID: {}", lesson.id),
            ));
        }
        if !(1..=5).contains(&lesson.difficulty) {
            warnings.push(ValidationWarning::new(
                &lesson.id,
                format!("difficulty {} is outside 1..5", lesson.difficulty),
            ));
        }
    }

    for assessment in &bank.assessments {
        if assessment.items.is_empty() {
            warnings.push(ValidationWarning::new(&assessment.id, "assessment has no items"));
        }
        for item in &assessment.items {
            if !seen_questions.contains(item.question_id.as_str()) {
                warnings.push(ValidationWarning::new(
                    &assessment.id,
                    format!("item references unknown question: {}", item.question_id),
                ));
            }
            if !(0.0..=1.0).contains(&item.weight) {
                warnings.push(ValidationWarning::new(
                    &assessment.id,
                    format!("weight {} for {} is outside [0, 1]", item.weight, item.question_id),
                ));
            }
        }
    }

    warnings
}

fn validate_question(question: &Question, warnings: &mut Vec<ValidationWarning>) {
    let id = question.id.as_str();

    if question.topics.is_empty() {
        warnings.push(ValidationWarning::new(id, "question has no topics"));
    }
    if !(1..=5).contains(&question.difficulty) {
        warnings.push(ValidationWarning::new(
            id,
            format!("difficulty {} is outside 1..5", question.difficulty),
        ));
    }

    match question.kind {
        QuestionKind::MultipleChoice => {
            let correct = question.options.iter().filter(|o| o.is_correct).count();
            if correct != 1 {
                warnings.push(ValidationWarning::new(
                    id,
                    format!("multiple-choice question has {correct} correct options, expected 1"),
                ));
            }
        }
        QuestionKind::Numeric | QuestionKind::ShortText => match &question.answer_key {
            None => warnings.push(ValidationWarning::new(
                id,
                format!("{} question has no answer_key", question.kind),
            )),
            Some(AnswerKey::Pattern(pattern)) => {
                if let Err(e) = Regex::new(pattern) {
                    warnings.push(ValidationWarning::new(
                        id,
                        format!("invalid answer pattern: {e}"),
                    ));
                }
            }
            Some(AnswerKey::Text(text)) if question.kind == QuestionKind::Numeric => {
                if text.trim().parse::<f64>().is_err() {
                    warnings.push(ValidationWarning::new(
                        id,
                        format!("numeric answer_key is not a number: {text}"),
                    ));
                }
            }
            Some(_) => {}
        },
    }
}
