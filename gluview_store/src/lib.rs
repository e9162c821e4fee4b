#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! JSON-file history persistence.
//!
//! A missing file is an empty history, a corrupt file is logged and treated
//! as empty (the monitor restarts its window rather than refusing to run),
//! and saves go through a sibling temp file + rename so a crash can never
//! leave a torn history behind.

use std::fs;
use std::path::{Path, PathBuf};

use gluview_traits::{HistoryStore, Sample};

pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&mut self) -> Result<Vec<Sample>, Box<dyn std::error::Error + Send + Sync>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no history file yet");
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Vec<Sample>>(&contents) {
            Ok(series) => Ok(series),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "history file unreadable; starting fresh"
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(
        &mut self,
        series: &[Sample],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let json = serde_json::to_string(series)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(count = series.len(), path = %self.path.display(), "history saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    fn series() -> Vec<Sample> {
        vec![
            Sample::reading(1_700_000_000_000, 110),
            Sample::reading(1_700_000_300_000, 114),
        ]
    }

    #[rstest]
    fn round_trips_a_series() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::new(dir.path().join("history.json"));
        store.save(&series()).unwrap();
        assert_eq!(store.load().unwrap(), series());
    }

    #[rstest]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[rstest]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();
        let mut store = JsonHistoryStore::new(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[rstest]
    fn save_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let mut store = JsonHistoryStore::new(dir.path().join("history.json"));
        store.save(&series()).unwrap();
        let shorter = vec![Sample::reading(1_700_000_600_000, 120)];
        store.save(&shorter).unwrap();
        assert_eq!(store.load().unwrap(), shorter);
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
