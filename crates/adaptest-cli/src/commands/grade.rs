//! The `adaptest grade` command.
//!
//! Runs one placement through the engine over in-memory stores: open a
//! session, score the answer sheet, finalize, and print the level and the
//! resulting recommendation set.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use adaptest_core::bank::{find_assessment, materialize_assessment, QuestionBank};
use adaptest_core::engine::AssessmentEngine;
use adaptest_core::level::top_level;
use adaptest_core::model::{
    AssessmentDefinition, AttemptResult, GradeBand, Lesson, RecommendationSet, SubmittedAnswer,
};
use adaptest_core::parser::{parse_bank, BankFile};
use adaptest_core::profile::is_weak;
use adaptest_core::session::RegistrationPayload;
use adaptest_core::traits::{SystemClock, UuidGenerator};
use adaptest_store::{load_config_from, MemoryStores};

const CLI_SUBJECT: &str = "cli";

#[derive(Debug, Serialize)]
struct GradeReport {
    grade: GradeBand,
    attempt: AttemptResult,
    recommendations: RecommendationSet,
}

pub fn execute(
    bank_path: PathBuf,
    answers_path: PathBuf,
    grade: String,
    assessment_id: Option<String>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if !matches!(format.as_str(), "text" | "json") {
        anyhow::bail!("Unknown format: {format}");
    }
    let config = load_config_from(config_path.as_deref())?;
    let grade: GradeBand = grade.parse()?;

    let bank = parse_bank(&bank_path)?;
    let questions = bank.question_bank();
    let definition = resolve_assessment(
        &bank,
        &questions,
        grade,
        assessment_id.as_deref(),
        config.placement_question_limit,
    )?;
    let answers = load_answers(&answers_path)?;

    let stores = MemoryStores::new();
    let engine = AssessmentEngine::new(
        stores.engine_stores(Arc::new(SystemClock), Arc::new(UuidGenerator)),
        config.engine_config(),
    );

    let session_id = engine.start_placement(grade, RegistrationPayload::new(Vec::new()))?;
    let attempt = engine.submit_placement(&session_id, &definition, &questions, &answers)?;
    let registration = engine.complete_registration(&session_id, CLI_SUBJECT, &bank.lessons)?;

    let report = GradeReport {
        grade,
        attempt,
        recommendations: registration.recommendations,
    };

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_text(&definition, &report, &bank.lessons),
    }

    Ok(())
}

fn resolve_assessment(
    bank: &BankFile,
    questions: &QuestionBank,
    grade: GradeBand,
    assessment_id: Option<&str>,
    limit: usize,
) -> Result<AssessmentDefinition> {
    if let Some(id) = assessment_id {
        return bank
            .assessments
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .with_context(|| format!("assessment not found in bank '{}': {id}", bank.id));
    }

    match find_assessment(&bank.assessments, grade) {
        Some(definition) => Ok(definition.clone()),
        None => {
            tracing::info!("no assessment for grade {grade} in '{}', building one", bank.id);
            Ok(materialize_assessment(questions, grade, limit)?)
        }
    }
}

fn load_answers(path: &Path) -> Result<Vec<SubmittedAnswer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", path.display()))
}

fn print_text(definition: &AssessmentDefinition, report: &GradeReport, lessons: &[Lesson]) {
    use comfy_table::{Cell, Table};

    let attempt = &report.attempt;
    println!(
        "Assessment: {} ({} items, {} answered)",
        definition.id,
        definition.items.len(),
        attempt.items.len()
    );
    println!("Score: {:.1}%", attempt.total_score_percent);
    if let Some(level) = attempt.level_estimate {
        println!(
            "Level: {level} of {} (grade {})",
            top_level(report.grade),
            report.grade
        );
    }

    if !attempt.topics_profile.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Topic", "Mastery", "Status"]);
        for (topic, mastery) in &attempt.topics_profile {
            table.add_row(vec![
                Cell::new(topic),
                Cell::new(format!("{:.0}%", mastery * 100.0)),
                Cell::new(if is_weak(*mastery) { "weak" } else { "ok" }),
            ]);
        }
        println!("\n{table}");
    }

    if attempt.weak_topics.is_empty() {
        println!("\nWeak topics: none");
    } else {
        println!("\nWeak topics: {}", attempt.weak_topics.join(", "));
    }

    let recommendations = &report.recommendations;
    if recommendations.content_ids.is_empty() {
        println!("No lessons available to recommend.");
    } else {
        println!("Recommended lessons:");
        for (i, id) in recommendations.content_ids.iter().enumerate() {
            let title = lessons
                .iter()
                .find(|l| &l.id == id)
                .map(|l| l.title.as_str())
                .unwrap_or_default();
            println!("  {}. {id}  {title}", i + 1);
        }
    }
    println!("{}", recommendations.rationale);
}
