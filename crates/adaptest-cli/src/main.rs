//! adaptest CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "adaptest",
    version,
    about = "Adaptive assessment and recommendation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory (default: bank_dir from config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade an answer sheet as a placement test and recommend lessons
    Grade {
        /// Question bank TOML file
        #[arg(long)]
        bank: PathBuf,

        /// JSON array of submitted answers
        #[arg(long)]
        answers: PathBuf,

        /// Grade band: 6-12 or EESH
        #[arg(long)]
        grade: String,

        /// Assessment id (default: first active assessment for the grade)
        #[arg(long)]
        assessment: Option<String>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check whether a learner may take a retest
    Retest {
        /// JSON array of level records
        #[arg(long)]
        history: Option<PathBuf>,

        /// Subject id (default: subject of the first record)
        #[arg(long)]
        subject: Option<String>,

        /// Learning activities completed since the last assessment
        #[arg(long, default_value = "0")]
        activities: u32,

        /// Evaluate at this RFC 3339 time instead of now
        #[arg(long)]
        at: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

fn main() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "adaptest=info".parse::<tracing_subscriber::filter::Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Grade {
            bank,
            answers,
            grade,
            assessment,
            format,
            config,
        } => commands::grade::execute(bank, answers, grade, assessment, format, config),
        Commands::Retest {
            history,
            subject,
            activities,
            at,
            config,
        } => commands::retest::execute(history, subject, activities, at, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
