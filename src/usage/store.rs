//! Persistence boundary for the usage tracker.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::warn;

use crate::io::write_bytes_atomically;

/// Call timestamps per provider, oldest first.
pub type UsageSnapshot = BTreeMap<String, Vec<DateTime<Utc>>>;

pub const USAGE_FILE_NAME: &str = "usage.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("usage store {} unreadable: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("usage store {} is corrupted: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("could not lock usage store {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait UsageStore: Send + Sync {
    fn load(&self) -> Result<UsageSnapshot, StoreError>;

    /// Read-modify-write under whatever exclusion the store provides.
    /// Returns the snapshot as persisted.
    fn update(&self, apply: &mut dyn FnMut(&mut UsageSnapshot)) -> Result<UsageSnapshot, StoreError>;

    fn describe(&self) -> String;
}

/// JSON file guarded by an advisory lock on a sidecar `.lock` file, so
/// concurrent runs sharing a state directory do not lose updates.
#[derive(Debug, Clone)]
pub struct FileUsageStore {
    path: PathBuf,
}

impl FileUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(USAGE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn acquire_lock(&self) -> Result<File, StoreError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let lock_err = |source| StoreError::Lock {
            path: lock_path.clone(),
            source,
        };
        let file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(lock_err)?;
        file.lock().map_err(lock_err)?;
        Ok(file)
    }

    fn read_snapshot(&self) -> Result<UsageSnapshot, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UsageSnapshot::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if contents.trim().is_empty() {
            return Ok(UsageSnapshot::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl UsageStore for FileUsageStore {
    fn load(&self) -> Result<UsageSnapshot, StoreError> {
        self.read_snapshot()
    }

    fn update(&self, apply: &mut dyn FnMut(&mut UsageSnapshot)) -> Result<UsageSnapshot, StoreError> {
        let lock = self.acquire_lock()?;

        let mut snapshot = match self.read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!("{err}; starting from empty usage");
                UsageSnapshot::new()
            }
            Err(err) => return Err(err),
        };
        apply(&mut snapshot);

        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        write_bytes_atomically(&self.path, &json).map_err(|e| self.io_error(e))?;

        drop(lock);
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store for tests and for runs without a writable state dir.
#[derive(Debug, Default)]
pub struct MemoryUsageStore {
    snapshot: Mutex<UsageSnapshot>,
}

impl MemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: UsageSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
        }
    }
}

impl UsageStore for MemoryUsageStore {
    fn load(&self) -> Result<UsageSnapshot, StoreError> {
        Ok(self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut UsageSnapshot)) -> Result<UsageSnapshot, StoreError> {
        let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        Ok(guard.clone())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty_and_update_creates_it() {
        let dir = TempDir::new().unwrap();
        let store = FileUsageStore::in_dir(&dir.path().join("state"));
        assert!(store.load().unwrap().is_empty());

        let now = Utc::now();
        store
            .update(&mut |snap| snap.entry("groq".into()).or_default().push(now))
            .unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded["groq"], vec![now]);
        assert!(store.lock_path().ends_with("usage.json.lock"));
    }

    #[test]
    fn corrupt_file_is_reported_on_load_and_repaired_on_update() {
        let dir = TempDir::new().unwrap();
        let store = FileUsageStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));

        let snapshot = store
            .update(&mut |snap| {
                snap.entry("anthropic".into()).or_default().push(Utc::now());
            })
            .unwrap();
        assert_eq!(snapshot["anthropic"].len(), 1);
        assert!(store.load().is_ok());
    }
}
