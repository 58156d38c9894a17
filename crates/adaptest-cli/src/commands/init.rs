//! The `adaptest init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    std::fs::create_dir_all("banks")?;
    let example_path = Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Add questions, assessments and lessons to banks/example.toml");
    println!("  2. Run: adaptest validate --bank banks");
    println!("  3. Run: adaptest grade --bank banks/example.toml --answers answers.json --grade 7");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

recommendation_count = 6
retest_interval_days = 14
retest_after_n_activities = 8
session_ttl_hours = 24
placement_question_limit = 20
bank_dir = "./banks"
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small bank to get started"

[[questions]]
id = "speed"
stem = "A runner covers 100 m in 20 s. What is the average speed in m/s?"
kind = "numeric"
answer_key = { number = 5.0 }
topics = ["kinematics"]
difficulty = 1

[[questions]]
id = "force-unit"
stem = "What is the SI unit of force?"
kind = "short_text"
answer_key = { pattern = "^newtons?$" }
topics = ["forces"]
difficulty = 1

[[questions]]
id = "energy-type"
stem = "A moving ball has which kind of energy?"
kind = "mcq"
topics = ["energy"]
difficulty = 2
options = [
    { id = "a", text = "Kinetic", is_correct = true },
    { id = "b", text = "Chemical" },
]

[[assessments]]
id = "placement-7"
title = "Grade 7 placement"
grade_range = ["7"]
items = [
    { question_id = "speed" },
    { question_id = "force-unit" },
    { question_id = "energy-type" },
]

[[lessons]]
id = "motion-basics"
title = "Describing motion"
topics = ["kinematics"]
difficulty = 1
published = true

[[lessons]]
id = "pushes-and-pulls"
title = "Pushes and pulls"
topics = ["forces"]
difficulty = 2
published = true
"#;
