//! File-backed key/value storage: one `<key>.json` file per key.

use std::fs;
use std::path::PathBuf;

use decision_lab_core::curriculum::{KeyValueStore, RepositoryError};
use tracing::debug;

pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{name}.json"))
    }
}

fn storage_error(e: std::io::Error) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(storage_error)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.base_dir).map_err(storage_error)?;
        let path = self.path(key);
        // Write then rename: readers see the old value or the new one.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(storage_error)?;
        fs::rename(&tmp, &path).map_err(storage_error)?;
        debug!(path = %path.display(), bytes = value.len(), "stored value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("decision-lab-scenario-year").unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        store.set("decision-lab-scenario-year", "{\"id\":1}").unwrap();
        assert_eq!(
            store.get("decision-lab-scenario-year").unwrap().as_deref(),
            Some("{\"id\":1}")
        );
        assert!(dir.path().join("data/decision-lab-scenario-year.json").exists());
        assert!(!dir.path().join("data/decision-lab-scenario-year.json.tmp").exists());
    }

    #[test]
    fn key_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.set("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }
}
