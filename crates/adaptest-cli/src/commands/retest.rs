//! The `adaptest retest` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use adaptest_core::engine::AssessmentEngine;
use adaptest_core::model::LevelRecord;
use adaptest_core::traits::{LevelLog, UuidGenerator};
use adaptest_store::{load_config_from, ManualClock, MemoryStores};

pub fn execute(
    history_path: Option<PathBuf>,
    subject: Option<String>,
    activities: u32,
    at: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let now = match at {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("invalid --at timestamp: {raw}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let records = match &history_path {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };
    let subject = subject
        .or_else(|| records.first().map(|r| r.subject_id.clone()))
        .unwrap_or_else(|| "learner".to_string());

    let stores = MemoryStores::new();
    for record in records {
        stores.levels.append(record);
    }
    let engine = AssessmentEngine::new(
        stores.engine_stores(Arc::new(ManualClock::new(now)), Arc::new(UuidGenerator)),
        config.engine_config(),
    );

    let eligibility = engine.retest_schedule(&subject, activities);
    let policy = engine.config().retest_policy();

    println!("Subject: {subject}");
    match eligibility.last_assessed_at {
        Some(last) => println!("Last assessed: {}", format_time(last)),
        None => println!("Last assessed: never"),
    }
    println!(
        "Activities completed: {} (threshold {})",
        eligibility.activities_completed, policy.activity_threshold
    );
    println!(
        "Eligible: {}",
        if eligibility.eligible { "yes" } else { "no" }
    );
    if eligibility.next_eligible_at == DateTime::<Utc>::MAX_UTC {
        println!("Next eligible: never (by time)");
    } else {
        println!("Next eligible: {}", format_time(eligibility.next_eligible_at));
    }

    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<LevelRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read level history: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse level history: {}", path.display()))
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}
