//! Client configuration at `~/.decision-lab/config.toml`.
//!
//! Holds curriculum settings and where data files live.
//! CLI flags always override config file values.

use anyhow::{Context, Result};
use decision_lab_core::CurriculumConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub curriculum: CurriculumConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

/// File locations. Unset entries fall back to `~/.decision-lab`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the stored year and play logs.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Rubric JSON used by `score` and `play`. The bundled rubric otherwise.
    #[serde(default)]
    pub rubric: Option<PathBuf>,
}

/// `~/.decision-lab`, or `.decision-lab` when there is no home directory.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".decision-lab")
}

pub fn default_path() -> PathBuf {
    home_dir().join("config.toml")
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        config
            .curriculum
            .validate()
            .with_context(|| format!("invalid [curriculum] in {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.paths.data_dir.clone().unwrap_or_else(home_dir)
    }
}
