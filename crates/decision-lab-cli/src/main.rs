//! decision-lab — weekly decision-making scenarios from the terminal.
//!
//! Generates and stores the scenario year, shows what is unlocked this
//! week and today, scores written justifications, and plays scenarios.

mod commands;
mod config;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use decision_lab_core::session::StudentProfile;
use decision_lab_core::Justification;
use tracing::error;

use commands::play::PlayOptions;
use commands::score::Input;
use commands::App;

/// decision-lab — Decision Lab scenarios
#[derive(Parser)]
#[command(name = "decision-lab", version = "0.1.0", about = "Weekly decision-making scenarios, unlock schedule, and rubric scoring")]
struct Cli {
    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Local time to act as now: YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]
    #[arg(long = "now", global = true, value_parser = parse_now)]
    now: Option<NaiveDateTime>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a scenario year
    Generate {
        /// Seed string (defaults to the start date as YYYYMMDD)
        #[arg(long)]
        seed: Option<String>,
        /// First day of the year (defaults to this week's Monday)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Write the year JSON to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Store as the current year
        #[arg(long)]
        save: bool,
    },

    /// Show this week's scenarios
    Week {
        #[arg(long)]
        json: bool,
    },

    /// Show today's scenario
    Today {
        #[arg(long)]
        json: bool,
    },

    /// Preview the year month by month
    Preview {
        #[arg(long)]
        json: bool,
    },

    /// Score a justification against the rubric
    Score {
        /// Text to score (reads stdin when no text or answers are given)
        text: Option<String>,
        #[arg(long)]
        tool: Option<String>,
        #[arg(long)]
        concept: Option<String>,
        #[arg(long)]
        why: Option<String>,
        /// Rubric JSON file
        #[arg(long)]
        rubric: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },

    /// Play a scenario (today's by default)
    Play {
        /// Scenario id, e.g. week1-scenario3
        scenario: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        age: Option<String>,
        /// Rubric JSON file
        #[arg(long)]
        rubric: Option<PathBuf>,
        /// Replay decisions from a JSON file instead of prompting
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Where to write the play log
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_date(s).ok().map(|d| d.and_time(NaiveTime::MIN)))
        .ok_or_else(|| format!("invalid time '{s}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM"))
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let cfg = config::Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let app = App {
        config: cfg,
        now: cli.now.unwrap_or_else(|| Local::now().naive_local()),
    };

    match cli.command {
        Command::Generate {
            seed,
            start,
            output,
            save,
        } => commands::generate::run(&app, seed.as_deref(), start, output.as_deref(), save),
        Command::Week { json } => commands::week::run(&app, json),
        Command::Today { json } => commands::today::run(&app, json),
        Command::Preview { json } => commands::preview::run(&app, json),
        Command::Score {
            text,
            tool,
            concept,
            why,
            rubric,
            json,
        } => {
            let input = match (text.as_deref(), tool, concept, why) {
                (Some(text), _, _, _) => Input::Text(text),
                (None, None, None, None) => Input::Stdin,
                (None, tool, concept, why) => Input::Answers(Justification::new(
                    tool.as_deref().unwrap_or_default(),
                    concept.as_deref().unwrap_or_default(),
                    why.as_deref().unwrap_or_default(),
                )),
            };
            commands::score::run(&app, input, rubric.as_deref(), json)
        }
        Command::Play {
            scenario,
            name,
            grade,
            age,
            rubric,
            answers,
            log,
        } => commands::play::run(
            &app,
            PlayOptions {
                scenario: scenario.as_deref(),
                rubric: rubric.as_deref(),
                answers: answers.as_deref(),
                log: log.as_deref(),
                profile: StudentProfile {
                    student_name: name.unwrap_or_default(),
                    student_grade: grade.unwrap_or_default(),
                    student_age: age.unwrap_or_default(),
                },
            },
        ),
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing. Logs go to stderr.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("decision_lab=debug,decision_lab_core=debug")
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("decision_lab=warn,decision_lab_core=warn")
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("decision-lab: {e:#}");
        std::process::exit(1);
    }
}
