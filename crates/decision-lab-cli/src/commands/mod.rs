//! CLI subcommand implementations.

pub mod generate;
pub mod play;
pub mod preview;
pub mod score;
pub mod today;
pub mod week;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use decision_lab_core::curriculum::KeyValueRepository;
use decision_lab_core::{load_or_generate, CurriculumYear, Rubric};

use crate::config::Config;
use crate::store::FileStore;

const BUNDLED_RUBRIC: &str = include_str!("../../data/rubric.json");

/// Settings and clock shared by every subcommand.
pub struct App {
    pub config: Config,
    pub now: NaiveDateTime,
}

impl App {
    pub fn repository(&self) -> KeyValueRepository<FileStore> {
        KeyValueRepository::new(
            FileStore::new(self.config.data_dir()),
            self.config.curriculum.storage_key.clone(),
        )
    }

    /// The running year, regenerating and storing it when it has ended.
    pub fn year(&self) -> Result<CurriculumYear> {
        let mut repo = self.repository();
        load_or_generate(&mut repo, self.now, &self.config.curriculum)
            .context("failed to load the curriculum year")
    }

    /// Rubric from `path`, the configured path, or the bundled default.
    pub fn rubric(&self, path: Option<&Path>) -> Result<Rubric> {
        match path.or(self.config.paths.rubric.as_deref()) {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read rubric at {}", path.display()))?;
                Rubric::from_json(&json)
                    .with_context(|| format!("invalid rubric at {}", path.display()))
            }
            None => Rubric::from_json(BUNDLED_RUBRIC).context("invalid bundled rubric"),
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn app(dir: &Path) -> App {
        let mut config = Config::default();
        config.paths.data_dir = Some(dir.to_path_buf());
        App {
            config,
            now: NaiveDate::from_ymd_opt(2026, 2, 4)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn bundled_rubric_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let rubric = app(dir.path()).rubric(None).unwrap();
        assert_eq!(rubric.criteria.len(), 4);
        assert_eq!(rubric.minimum_length, 120);
    }

    #[test]
    fn rubric_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(app(dir.path()).rubric(Some(&missing)).is_err());
    }

    #[test]
    fn year_is_stored_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let first = app.year().unwrap();
        assert_eq!(first.id, "year-20260202");
        assert!(dir.path().join("decision-lab-scenario-year.json").exists());
        assert_eq!(app.year().unwrap(), first);
    }
}
