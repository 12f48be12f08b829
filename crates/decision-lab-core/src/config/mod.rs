use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Curriculum generation and rotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumConfig {
    #[serde(default = "default_weeks_per_year")]
    pub weeks_per_year: usize,

    /// First Monday of the rotation. Years never start before this date.
    #[serde(default = "default_rotation_start")]
    pub rotation_start: NaiveDate,

    #[serde(default = "default_max_sample_attempts")]
    pub max_sample_attempts: usize,

    /// Key the serialized year is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_weeks_per_year() -> usize {
    40
}
fn default_rotation_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 2).unwrap_or_default()
}
fn default_max_sample_attempts() -> usize {
    10_000
}
fn default_storage_key() -> String {
    "decision-lab-scenario-year".to_string()
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            weeks_per_year: default_weeks_per_year(),
            rotation_start: default_rotation_start(),
            max_sample_attempts: default_max_sample_attempts(),
            storage_key: default_storage_key(),
        }
    }
}

impl CurriculumConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.weeks_per_year == 0 {
            return Err(ConfigError::ValidationError(
                "weeks_per_year must be > 0".to_string(),
            ));
        }
        if self.max_sample_attempts < self.weeks_per_year {
            return Err(ConfigError::ValidationError(
                "max_sample_attempts must be >= weeks_per_year".to_string(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    ParseError(String),
    #[error("failed to serialize config: {0}")]
    SerializeError(String),
    #[error("config validation failed: {0}")]
    ValidationError(String),
}
