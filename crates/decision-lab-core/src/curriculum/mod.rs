//! One year of generated scenarios, and the policy for reusing or replacing it.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::CurriculumConfig;
use crate::context::{ContextCorpus, ContextSampler, GenerationError};
use crate::rng::Mulberry32;
use crate::scenario::{Scenario, SCENARIOS_PER_WEEK, TEMPLATES};
use crate::schedule::{start_of_week_monday, week_index};

/// Generate `weeks * SCENARIOS_PER_WEEK` scenarios from a seed string.
pub fn generate_scenarios(
    seed: &str,
    weeks: usize,
    max_attempts: usize,
) -> Result<Vec<Scenario>, GenerationError> {
    generate_scenarios_from(&ContextCorpus::builtin(), seed, weeks, max_attempts)
}

/// Same as [`generate_scenarios`] over a custom corpus.
pub fn generate_scenarios_from(
    corpus: &ContextCorpus,
    seed: &str,
    weeks: usize,
    max_attempts: usize,
) -> Result<Vec<Scenario>, GenerationError> {
    let mut rng = Mulberry32::from_seed_str(seed);
    let contexts = ContextSampler::new(corpus, max_attempts).sample(&mut rng, weeks)?;

    let mut scenarios = Vec::with_capacity(weeks * SCENARIOS_PER_WEEK);
    for (week_index, context) in contexts.iter().enumerate() {
        for (template_index, flavor) in TEMPLATES.iter().enumerate() {
            scenarios.push(flavor.build(context, week_index, template_index));
        }
    }
    Ok(scenarios)
}

/// Seed string for a year starting on `date`, e.g. `20260202`.
pub fn seed_for(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumYear {
    pub id: String,
    pub start_date: NaiveDateTime,
    pub scenarios: Vec<Scenario>,
}

impl CurriculumYear {
    pub fn generate(
        seed: &str,
        start_date: NaiveDateTime,
        config: &CurriculumConfig,
    ) -> Result<Self, GenerationError> {
        let scenarios =
            generate_scenarios(seed, config.weeks_per_year, config.max_sample_attempts)?;
        info!(seed, scenarios = scenarios.len(), "generated curriculum year");
        Ok(Self {
            id: format!("year-{seed}"),
            start_date,
            scenarios,
        })
    }

    /// Year starting at midnight on `date`, seeded from the date itself.
    pub fn for_week_start(date: NaiveDate, config: &CurriculumConfig) -> Result<Self, GenerationError> {
        Self::generate(&seed_for(date), date.and_time(NaiveTime::MIN), config)
    }

    pub fn week_count(&self) -> usize {
        self.scenarios.len() / SCENARIOS_PER_WEEK
    }

    /// Scenarios of a zero-based week. Empty when out of range.
    pub fn week(&self, week: usize) -> &[Scenario] {
        let start = week * SCENARIOS_PER_WEEK;
        let end = start + SCENARIOS_PER_WEEK;
        self.scenarios.get(start..end).unwrap_or(&[])
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Check the structure a stored year must have to be reused.
    pub fn validate(&self) -> Result<(), CurriculumError> {
        if self.scenarios.is_empty() || self.scenarios.len() % SCENARIOS_PER_WEEK != 0 {
            return Err(CurriculumError::Invalid(format!(
                "{} scenarios is not a whole number of weeks",
                self.scenarios.len()
            )));
        }
        let mut ids = HashSet::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            if !ids.insert(scenario.id.as_str()) {
                return Err(CurriculumError::Invalid(format!(
                    "duplicate scenario id {}",
                    scenario.id
                )));
            }
            if let Some(step) = scenario.dangling_ref() {
                return Err(CurriculumError::Invalid(format!(
                    "scenario {} references missing step {step}",
                    scenario.id
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        serde_json::from_str(json).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, RepositoryError> {
        serde_json::to_string(self).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }
}

/// Where the current year is kept between runs.
pub trait CurriculumRepository {
    fn load(&self) -> Result<Option<CurriculumYear>, RepositoryError>;
    fn save(&mut self, year: &CurriculumYear) -> Result<(), RepositoryError>;
}

/// String key/value storage, e.g. browser local storage or a file.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), RepositoryError>;
}

/// In-process store for tests and short-lived hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stores the year as one JSON string under a single key.
pub struct KeyValueRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> KeyValueRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: KeyValueStore> CurriculumRepository for KeyValueRepository<S> {
    fn load(&self) -> Result<Option<CurriculumYear>, RepositoryError> {
        match self.store.get(&self.key)? {
            Some(json) => CurriculumYear::from_json(&json).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, year: &CurriculumYear) -> Result<(), RepositoryError> {
        let json = year.to_json()?;
        self.store.set(&self.key, &json)
    }
}

/// First day of a freshly generated year: this week's Monday, but never
/// earlier than the rotation start.
pub fn rotation_start_for(now: NaiveDateTime, config: &CurriculumConfig) -> NaiveDate {
    let rotation_start = config.rotation_start.and_time(NaiveTime::MIN);
    if now >= rotation_start {
        start_of_week_monday(now).date()
    } else {
        config.rotation_start
    }
}

/// Return the stored year while it is still running, otherwise generate and
/// save its replacement.
///
/// A missing, unreadable, or structurally invalid stored year is a cache miss.
pub fn load_or_generate<R: CurriculumRepository + ?Sized>(
    repo: &mut R,
    now: NaiveDateTime,
    config: &CurriculumConfig,
) -> Result<CurriculumYear, CurriculumError> {
    match repo.load() {
        Ok(Some(year)) => match year.validate() {
            Ok(()) if year.week_count() != config.weeks_per_year => {
                warn!(
                    id = %year.id,
                    weeks = year.week_count(),
                    expected = config.weeks_per_year,
                    "stored year has the wrong length, regenerating"
                );
            }
            Ok(()) => {
                let elapsed = week_index(year.start_date, now);
                if elapsed < config.weeks_per_year {
                    debug!(id = %year.id, week = elapsed, "reusing stored year");
                    return Ok(year);
                }
                info!(id = %year.id, week = elapsed, "stored year has ended");
            }
            Err(e) => warn!(id = %year.id, error = %e, "stored year is invalid, regenerating"),
        },
        Ok(None) => debug!("no stored year"),
        Err(e) => warn!(error = %e, "stored year is unreadable, regenerating"),
    }

    let year = CurriculumYear::for_week_start(rotation_start_for(now, config), config)?;
    repo.save(&year)?;
    Ok(year)
}

/// Errors from year storage.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from producing or checking a curriculum year.
#[derive(Debug, thiserror::Error)]
pub enum CurriculumError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("invalid curriculum year: {0}")]
    Invalid(String),
}
