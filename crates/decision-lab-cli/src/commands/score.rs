//! `decision-lab score` — score a justification against the rubric.
//!
//! Text comes from the positional argument, the `--tool/--concept/--why`
//! answers, or stdin.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use decision_lab_core::rubric::ScoreResult;
use decision_lab_core::Justification;

use super::{print_json, App};

/// Where the text to score comes from.
pub enum Input<'a> {
    Text(&'a str),
    Answers(Justification),
    Stdin,
}

pub fn run(app: &App, input: Input<'_>, rubric: Option<&Path>, json: bool) -> Result<()> {
    let rubric = app.rubric(rubric)?;
    let text = match input {
        Input::Text(text) => text.to_string(),
        Input::Answers(answers) => answers.render(),
        Input::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read justification from stdin")?;
            buf
        }
    };

    let result = rubric.score(&text);
    if json {
        return print_json(&result);
    }
    print_result(&result);
    Ok(())
}

pub fn print_result(result: &ScoreResult) {
    for score in &result.scores {
        println!(
            "  {:<14} {}/{}",
            score.criterion.name, score.score, score.criterion.max
        );
    }
    println!("  {:<14} {}", "Length bonus", result.length_bonus);
    println!("  {:<14} {}", "Total", result.total());
    if result.missing_groups.is_empty() {
        println!("  Tool, concept and why are all covered.");
    } else {
        println!("  Missing: {}", result.missing_groups.join(", "));
    }
}
