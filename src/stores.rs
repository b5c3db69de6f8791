//! Persistent operator-maintained stores: per-party freight targets and
//! the pending-exclusion list.
//!
//! Both are small JSON documents on disk. A missing file reads as empty
//! (first run), an unreadable or corrupt file is `SourceUnavailable`,
//! and writes go through a temp file plus rename so a failed write never
//! truncates the existing document.

use crate::error::{LedgerError, Result};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Monthly freight targets keyed by canonical party name.
pub trait TargetStore {
    fn read_all(&self) -> Result<BTreeMap<String, f64>>;
    fn upsert(&mut self, party: &str, value: f64) -> Result<()>;
}

/// Trip ids the operator has dismissed from the pending-CN report.
pub trait ExclusionStore {
    fn read_all(&self) -> Result<BTreeSet<String>>;
    fn append(&mut self, trip_id: &str) -> Result<()>;
    fn remove(&mut self, trip_id: &str) -> Result<()>;
}

fn read_json_or_empty<T: Default + serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        debug!("store {} absent, treating as empty", path.display());
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| LedgerError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| LedgerError::SourceUnavailable(format!("{}: {}", path.display(), e)))
}

/// Serialize and atomically replace the document at `path`.
fn write_json<T: serde::Serialize>(path: &Path, value: &T, key: &str) -> Result<()> {
    let write_failure = |reason: String| LedgerError::StoreWriteFailure {
        key: key.to_string(),
        reason,
    };

    let contents = serde_json::to_string_pretty(value).map_err(|e| write_failure(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(|e| write_failure(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| write_failure(e.to_string()))?;
    Ok(())
}

pub struct JsonTargetStore {
    path: PathBuf,
}

impl JsonTargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TargetStore for JsonTargetStore {
    fn read_all(&self) -> Result<BTreeMap<String, f64>> {
        read_json_or_empty(&self.path)
    }

    fn upsert(&mut self, party: &str, value: f64) -> Result<()> {
        let mut targets = self.read_all()?;
        targets.insert(party.to_string(), value);
        write_json(&self.path, &targets, party)?;
        info!("target for '{}' set to {}", party, value);
        Ok(())
    }
}

pub struct JsonExclusionStore {
    path: PathBuf,
}

impl JsonExclusionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    // Stored as a list to keep the file diffable; order is insertion order.
    fn read_list(&self) -> Result<Vec<String>> {
        read_json_or_empty(&self.path)
    }
}

impl ExclusionStore for JsonExclusionStore {
    fn read_all(&self) -> Result<BTreeSet<String>> {
        Ok(self.read_list()?.into_iter().collect())
    }

    fn append(&mut self, trip_id: &str) -> Result<()> {
        let mut list = self.read_list()?;
        if list.iter().any(|id| id == trip_id) {
            return Ok(());
        }
        list.push(trip_id.to_string());
        write_json(&self.path, &list, trip_id)?;
        info!("trip '{}' excluded from pending report", trip_id);
        Ok(())
    }

    fn remove(&mut self, trip_id: &str) -> Result<()> {
        let mut list = self.read_list()?;
        let before = list.len();
        list.retain(|id| id != trip_id);
        if list.len() == before {
            return Ok(());
        }
        write_json(&self.path, &list, trip_id)?;
        info!("trip '{}' restored to pending report", trip_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_target_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonTargetStore::new(dir.path().join("targets.json"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_target_upsert_roundtrip() {
        let dir = tempdir().unwrap();
        let mut store = JsonTargetStore::new(dir.path().join("targets.json"));
        store.upsert("Honda Cars India Ltd", 1500000.0).unwrap();
        store.upsert("Tata Motors Ltd", 900000.0).unwrap();
        store.upsert("Honda Cars India Ltd", 1600000.0).unwrap();

        let targets = store.read_all().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets["Honda Cars India Ltd"], 1600000.0);
        assert_eq!(targets["Tata Motors Ltd"], 900000.0);
    }

    #[test]
    fn test_corrupt_file_is_source_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("targets.json");
        fs::write(&path, "{not json").unwrap();
        let store = JsonTargetStore::new(&path);
        assert!(matches!(
            store.read_all(),
            Err(LedgerError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_exclusion_append_and_remove() {
        let dir = tempdir().unwrap();
        let mut store = JsonExclusionStore::new(dir.path().join("exclusions.json"));
        store.append("T-100").unwrap();
        store.append("T-200").unwrap();
        store.append("T-100").unwrap(); // no duplicate

        let set = store.read_all().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("T-100"));

        store.remove("T-100").unwrap();
        let set = store.read_all().unwrap();
        assert_eq!(set.len(), 1);
        assert!(!set.contains("T-100"));

        // Removing an absent id is a no-op.
        store.remove("T-999").unwrap();
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("targets.json");
        let mut store = JsonTargetStore::new(&path);
        store.upsert("Honda Cars India Ltd", 100.0).unwrap();

        // Point a second store at a directory path so the rename fails.
        let mut broken = JsonTargetStore::new(dir.path());
        assert!(broken.upsert("X", 1.0).is_err());

        // Original document untouched.
        let targets = store.read_all().unwrap();
        assert_eq!(targets["Honda Cars India Ltd"], 100.0);
    }
}
