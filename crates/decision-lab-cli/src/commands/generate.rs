//! `decision-lab generate` — build a curriculum year from a seed.
//!
//! Without `--output` or `--save` the year is printed as JSON.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use decision_lab_core::curriculum::{rotation_start_for, seed_for, CurriculumRepository};
use decision_lab_core::CurriculumYear;
use tracing::info;

use super::{print_json, App};

pub fn run(
    app: &App,
    seed: Option<&str>,
    start: Option<NaiveDate>,
    output: Option<&Path>,
    save: bool,
) -> Result<()> {
    let config = &app.config.curriculum;
    let start = start.unwrap_or_else(|| rotation_start_for(app.now, config));
    let seed = seed.map(str::to_string).unwrap_or_else(|| seed_for(start));

    let year = CurriculumYear::generate(&seed, start.and_time(NaiveTime::MIN), config)
        .with_context(|| format!("failed to generate a year from seed {seed}"))?;

    if save {
        app.repository()
            .save(&year)
            .context("failed to store the generated year")?;
        info!(id = %year.id, "stored generated year");
    }

    match output {
        Some(path) => {
            let json = serde_json::to_string_pretty(&year).context("failed to serialize year")?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote {} ({} weeks, {} scenarios) to {}",
                year.id,
                year.week_count(),
                year.scenarios.len(),
                path.display()
            );
        }
        None if save => println!(
            "Stored {} ({} weeks, {} scenarios) starting {}",
            year.id,
            year.week_count(),
            year.scenarios.len(),
            start
        ),
        None => print_json(&year)?,
    }

    Ok(())
}
