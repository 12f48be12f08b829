//! `decision-lab preview` — the whole year grouped by month.

use anyhow::Result;
use decision_lab_core::schedule;

use super::{print_json, App};

pub fn run(app: &App, json: bool) -> Result<()> {
    let year = app.year()?;
    let months = schedule::month_preview(&year, app.now);

    if json {
        return print_json(&months);
    }

    println!("{} starting {}", year.id, year.start_date.date());
    for month in months.iter().filter(|m| !m.weeks.is_empty()) {
        let active = if month.active { "  <- now" } else { "" };
        println!();
        println!("{}{active}", month.label);
        for week in &month.weeks {
            let unlocked = week.slots.iter().filter(|s| s.unlocked).count();
            let current = if week.current { "*" } else { " " };
            println!(
                " {current} Week {:>2}  {} to {}  {unlocked}/{} unlocked",
                week.week + 1,
                week.week_start.date(),
                week.week_end,
                week.slots.len()
            );
        }
    }
    Ok(())
}
