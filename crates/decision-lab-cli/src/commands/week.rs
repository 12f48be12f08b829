//! `decision-lab week` — this week's scenarios and which are unlocked.

use anyhow::Result;
use decision_lab_core::schedule;
use decision_lab_core::scenario::SCENARIOS_PER_WEEK;

use super::{print_json, App};

const DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

pub fn run(app: &App, json: bool) -> Result<()> {
    let year = app.year()?;
    let week = schedule::current_week(&year, app.now);
    let start = schedule::week_start(&year, week);

    if json {
        let preview = schedule::year_preview(&year, app.now);
        return print_json(&preview.get(week));
    }

    println!(
        "Week {} of {} (starts {})",
        week + 1,
        year.week_count(),
        start.date()
    );
    for (position, scenario) in year.week(week).iter().enumerate() {
        let index = week * SCENARIOS_PER_WEEK + position;
        let marker = if schedule::is_scenario_unlocked(&year, index, app.now) {
            "open  "
        } else {
            "locked"
        };
        println!(
            "  {} {marker}  {:<18} {}  ({})",
            DAYS[position],
            scenario.id,
            scenario.title,
            scenario.stakes.join(", ")
        );
    }
    Ok(())
}
