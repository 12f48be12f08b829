//! `decision-lab play [scenario]` — walk through a scenario step by step.
//!
//! Interactive by default. `--answers FILE` replays a JSON list of
//! `{ choice, tool, concept, why }` decisions instead of prompting.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use decision_lab_core::feedback::{
    feedback_with_fallback, FallbackFeedback, FeedbackRequest, COMPLETE_MESSAGE,
};
use decision_lab_core::schedule;
use decision_lab_core::scenario::{Meters, Scenario, Step};
use decision_lab_core::session::{Position, StudentProfile};
use decision_lab_core::{CurriculumYear, Justification, Session};
use dialoguer::{Input, Select};
use serde::Deserialize;
use tracing::info;

use super::score::print_result;
use super::App;

#[derive(Debug, Deserialize)]
pub struct ScriptedAnswer {
    pub choice: String,
    pub tool: String,
    pub concept: String,
    pub why: String,
}

pub struct PlayOptions<'a> {
    pub scenario: Option<&'a str>,
    pub rubric: Option<&'a Path>,
    pub answers: Option<&'a Path>,
    pub log: Option<&'a Path>,
    pub profile: StudentProfile,
}

pub fn run(app: &App, opts: PlayOptions<'_>) -> Result<()> {
    let year = app.year()?;
    let scenario = pick_scenario(app, &year, opts.scenario)?;
    let rubric = app.rubric(opts.rubric)?;

    let mut script = match opts.answers {
        Some(path) => Some(read_answers(path)?.into_iter()),
        None => None,
    };

    let mut profile = opts.profile;
    if script.is_none() && profile.student_name.trim().is_empty() {
        profile = prompt_profile()?;
    }

    let mut session = Session::start(scenario, profile, app.now)?;
    println!("{}", session.scenario().title);
    println!("{}", session.scenario().summary);

    loop {
        let (step_id, step) = match session.position()? {
            Position::Complete => break,
            Position::At(id, step) => (id.to_string(), step.clone()),
        };

        println!();
        print_meters(session.display_meters());
        println!("{}", step.prompt);

        let (choice_id, justification) = match script.as_mut() {
            Some(answers) => {
                let answer = answers
                    .next()
                    .with_context(|| format!("answers ran out at {step_id}"))?;
                (
                    answer.choice,
                    Justification::new(&answer.tool, &answer.concept, &answer.why),
                )
            }
            None => prompt_decision(&mut session, &step)?,
        };

        let decision = session.submit(&choice_id, justification.clone(), &rubric)?;
        println!();
        println!("{}", decision.consequence());
        print_result(&decision.score);

        let request = FeedbackRequest::new(session.scenario(), &decision.choice, &justification);
        let feedback = feedback_with_fallback(&FallbackFeedback, &request);
        println!();
        println!("{}", feedback.feedback);
        for option in &feedback.options {
            println!("  - {option}");
        }
        println!("  Watch: {}", feedback.video_url);

        session.advance()?;
    }

    println!();
    print_meters(session.display_meters());
    println!("{COMPLETE_MESSAGE}");

    let path = match opts.log {
        Some(path) => path.to_path_buf(),
        None => default_log_path(app, session.scenario()),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, session.log_json()?)
        .with_context(|| format!("failed to write log to {}", path.display()))?;
    info!(path = %path.display(), entries = session.log().len(), "play log saved");
    println!("Log saved to {}", path.display());
    Ok(())
}

fn pick_scenario(app: &App, year: &CurriculumYear, id: Option<&str>) -> Result<Scenario> {
    let Some(id) = id else {
        return schedule::today_scenario(year, app.now)
            .cloned()
            .context("no scenario is scheduled today");
    };
    let index = year
        .scenarios
        .iter()
        .position(|s| s.id == id)
        .with_context(|| format!("no scenario with id {id} in {}", year.id))?;
    if !schedule::is_scenario_unlocked(year, index, app.now) {
        bail!("scenario {id} is still locked");
    }
    Ok(year.scenarios[index].clone())
}

fn read_answers(path: &Path) -> Result<Vec<ScriptedAnswer>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers at {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid answers in {}", path.display()))
}

fn default_log_path(app: &App, scenario: &Scenario) -> PathBuf {
    app.config.data_dir().join("logs").join(format!(
        "{}-{}.json",
        scenario.id,
        app.now.format("%Y%m%dT%H%M%S")
    ))
}

fn print_meters(meters: Meters) {
    println!(
        "[budget {}] [time {}] [trust {}]",
        meters.budget, meters.time, meters.trust
    );
}

#[allow(clippy::ptr_arg)]
fn required(input: &String) -> Result<(), &'static str> {
    if input.trim().is_empty() {
        Err("an answer is required")
    } else {
        Ok(())
    }
}

fn prompt_profile() -> Result<StudentProfile> {
    let student_name = ask("Your name")?;
    let student_grade: String = Input::new()
        .with_prompt("Grade")
        .allow_empty(true)
        .interact_text()
        .context("failed to read user input")?;
    let student_age: String = Input::new()
        .with_prompt("Age")
        .allow_empty(true)
        .interact_text()
        .context("failed to read user input")?;
    Ok(StudentProfile {
        student_name,
        student_grade,
        student_age,
    })
}

/// Ask for a choice, letting the student talk to the stakeholder first.
fn prompt_decision(session: &mut Session, step: &Step) -> Result<(String, Justification)> {
    println!("{}", session.coach_intro()?);

    let mut items: Vec<String> = step.choices.iter().map(|c| c.text.clone()).collect();
    items.push(format!("Talk to {}", step.stakeholder));

    let choice = loop {
        let picked = Select::new()
            .with_prompt("What do you do?")
            .items(&items)
            .default(0)
            .interact()
            .context("failed to read user input")?;
        match step.choices.get(picked) {
            Some(choice) => break choice.id.clone(),
            None => println!("{}: {}", step.stakeholder, session.coach_reply()?),
        }
    };

    let tool = ask("Tool")?;
    let concept = ask("Concept")?;
    let why = ask("Why")?;
    Ok((choice, Justification::new(&tool, &concept, &why)))
}

fn ask(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .validate_with(required)
        .interact_text()
        .context("failed to read user input")
}
