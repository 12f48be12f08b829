use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A temp dir with a config that keeps all data inside it.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[paths]\ndata_dir = {:?}\n",
            dir.path().join("data").to_string_lossy()
        ),
    )
    .unwrap();
    (dir, config)
}

fn cli(config: &Path, now: &str) -> Command {
    let mut cmd = Command::cargo_bin("decision-lab").unwrap();
    cmd.arg("--config").arg(config).arg("--now").arg(now);
    cmd
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn generate_prints_year_json() {
    let (_dir, config) = workspace();
    let year = stdout_json(cli(&config, "2026-03-04").args(["generate", "--start", "2026-02-02"]));
    assert_eq!(year["id"], "year-20260202");
    assert_eq!(year["startDate"], "2026-02-02T00:00:00");
    assert_eq!(year["scenarios"].as_array().unwrap().len(), 280);
    assert_eq!(year["scenarios"][7]["id"], "week2-scenario1");
}

#[test]
fn generate_defaults_to_this_weeks_monday() {
    let (_dir, config) = workspace();
    let year = stdout_json(cli(&config, "2026-11-11T10:00").arg("generate"));
    assert_eq!(year["id"], "year-20261109");
}

#[test]
fn generate_save_stores_year() {
    let (dir, config) = workspace();
    cli(&config, "2026-02-05")
        .args(["generate", "--save"])
        .assert()
        .success();
    assert!(dir
        .path()
        .join("data")
        .join("decision-lab-scenario-year.json")
        .exists());
}

#[test]
fn today_follows_weekday() {
    let (_dir, config) = workspace();
    let today = stdout_json(cli(&config, "2026-02-03T09:00").args(["today", "--json"]));
    assert_eq!(today["id"], "week1-scenario3");
    assert_eq!(today["steps"]["step1"]["choices"].as_array().unwrap().len(), 3);
}

#[test]
fn week_text_output() {
    let (_dir, config) = workspace();
    let output = cli(&config, "2026-02-10").arg("week").assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Week 2 of 40"));
    assert!(stdout.contains("week2-scenario1"));
    assert!(stdout.contains("locked"));
}

#[test]
fn preview_json_counts_weeks() {
    let (_dir, config) = workspace();
    let months = stdout_json(cli(&config, "2026-02-03").args(["preview", "--json"]));
    let months = months.as_array().unwrap();
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["label"], "February 2026");
    assert_eq!(months[0]["active"], true);
    let weeks: usize = months
        .iter()
        .map(|m| m["weeks"].as_array().unwrap().len())
        .sum();
    assert_eq!(weeks, 40);
}

#[test]
fn score_answers_json() {
    let (_dir, config) = workspace();
    let result = stdout_json(cli(&config, "2026-02-03").args([
        "score",
        "--tool",
        "decision matrix",
        "--concept",
        "opportunity cost",
        "--why",
        "because",
        "--json",
    ]));
    assert_eq!(result["matchedGroupCount"], 3);
    assert_eq!(result["missingGroups"].as_array().unwrap().len(), 0);
}

#[test]
fn score_empty_stdin() {
    let (_dir, config) = workspace();
    let result = stdout_json(
        cli(&config, "2026-02-03")
            .args(["score", "--json"])
            .write_stdin(""),
    );
    assert_eq!(result["lengthBonus"], 0);
    assert_eq!(result["missingGroups"], serde_json::json!(["tools", "concepts", "why"]));
    assert!(result["scores"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["score"] == 0));
}

#[test]
fn score_rejects_invalid_rubric() {
    let (dir, config) = workspace();
    let rubric = dir.path().join("rubric.json");
    std::fs::write(&rubric, r#"{"criteria": []}"#).unwrap();
    cli(&config, "2026-02-03")
        .args(["score", "some text", "--rubric"])
        .arg(&rubric)
        .assert()
        .failure();
}

#[test]
fn play_with_scripted_answers() {
    let (dir, config) = workspace();
    let answers = dir.path().join("answers.json");
    std::fs::write(
        &answers,
        r#"[
            {"choice": "fast", "tool": "pause", "concept": "trade-off", "why": "because time matters"},
            {"choice": "explain", "tool": "pros and cons", "concept": "values", "why": "so that they trust me"},
            {"choice": "plan", "tool": "plan a", "concept": "accountability", "why": "because I follow through"}
        ]"#,
    )
    .unwrap();
    let log = dir.path().join("log.json");

    let output = cli(&config, "2026-02-02T08:00")
        .args(["play", "--name", "Ada", "--answers"])
        .arg(&answers)
        .arg("--log")
        .arg(&log)
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Scenario complete."));

    let entries: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&log).unwrap()).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0]["type"], "profile");
    assert_eq!(entries[0]["scenarioId"], "week1-scenario1");
    assert_eq!(entries[3]["choice"], "plan");
}

#[test]
fn play_locked_scenario_fails() {
    let (_dir, config) = workspace();
    let output = cli(&config, "2026-02-02")
        .args(["play", "week1-scenario13", "--name", "Ada"])
        .assert()
        .failure();
    let stderr = String::from_utf8(output.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("locked"));
}

#[test]
fn invalid_now_is_rejected() {
    let (_dir, config) = workspace();
    cli(&config, "someday").arg("today").assert().failure();
}
