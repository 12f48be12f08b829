//! `decision-lab today` — the scenario unlocked today.

use anyhow::Result;
use decision_lab_core::scenario::Resolved;
use decision_lab_core::schedule;

use super::{print_json, App};

pub fn run(app: &App, json: bool) -> Result<()> {
    let year = app.year()?;
    let today = schedule::today_scenario(&year, app.now);

    if json {
        return print_json(&today);
    }

    let Some(scenario) = today else {
        println!("No scenario today.");
        return Ok(());
    };

    println!("{}  [{}]", scenario.title, scenario.id);
    println!("{}", scenario.summary);
    println!("Stakes: {}", scenario.stakes.join(", "));
    println!("Roles:  {}", scenario.roles.join(", "));
    if let Resolved::Step(_, step) = scenario.resolve(&scenario.start_step) {
        println!();
        println!("{}", step.prompt);
    }
    println!();
    println!("Run `decision-lab play {}` to start.", scenario.id);
    Ok(())
}
