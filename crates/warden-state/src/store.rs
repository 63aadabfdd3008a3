// store.rs — StateStore: typed access to persisted state domains.
//
// The store is split in two layers:
//
// - `StateBackend` moves raw JSON text in and out of durable storage, keyed by
//   domain name. `FileBackend` keeps one file per domain; `MemoryBackend` is a
//   map used in tests.
// - `StateStore` adds types on top: any `Domain` can be loaded, written,
//   updated, or reset. Decoding failures fall back to the domain default;
//   unreadable records are errors for critical domains.
//
// The kernel runs one evaluation at a time per project, so a load-mutate-save
// sequence is normally race free. `FileBackend` still takes an exclusive
// advisory lock around `update()` so two overlapping invocations cannot
// interleave a read-modify-write.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// A namespaced piece of session state.
///
/// `NAME` identifies the record in the backend. `CRITICAL` decides what
/// happens when storage fails: critical domains return the error, others log
/// it and carry on (a telemetry hiccup must never block the agent's action).
pub trait Domain: Serialize + DeserializeOwned + Default {
    const NAME: &'static str;
    const CRITICAL: bool = true;
}

/// Holds the backend's write lock (if any) until dropped.
pub struct UpdateGuard {
    file: Option<File>,
}

impl UpdateGuard {
    /// A guard that holds nothing, for backends without locking.
    pub fn unlocked() -> Self {
        Self { file: None }
    }

    fn locked(file: File) -> Self {
        Self { file: Some(file) }
    }
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// Raw storage for domain records.
pub trait StateBackend {
    /// Return the stored text for a domain, or `None` if it was never written.
    fn load(&self, domain: &str) -> Result<Option<String>, StoreError>;

    /// Durably replace the stored text for a domain.
    fn store(&self, domain: &str, contents: &str) -> Result<(), StoreError>;

    /// Remove a domain's record. Removing a missing record is not an error.
    fn remove(&self, domain: &str) -> Result<(), StoreError>;

    /// Acquire exclusive access for a read-modify-write.
    fn begin_update(&self) -> Result<UpdateGuard, StoreError> {
        Ok(UpdateGuard::unlocked())
    }
}

/// One JSON file per domain: `<dir>/<domain>.json`.
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Path to the record file for a domain.
    pub fn record_path(&self, domain: &str) -> PathBuf {
        self.dir.join(format!("{}.json", domain))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".lock")
    }
}

impl StateBackend for FileBackend {
    fn load(&self, domain: &str) -> Result<Option<String>, StoreError> {
        let path = self.record_path(domain);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(contents))
    }

    fn store(&self, domain: &str, contents: &str) -> Result<(), StoreError> {
        // Write to a sibling temp file and rename over the record, so a crash
        // mid-write leaves either the old record or the new one, never half.
        let path = self.record_path(domain);
        let tmp = self.dir.join(format!(".{}.json.tmp", domain));
        fs::write(&tmp, contents).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&self, domain: &str) -> Result<(), StoreError> {
        let path = self.record_path(domain);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })
    }

    fn begin_update(&self) -> Result<UpdateGuard, StoreError> {
        let path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|source| StoreError::Lock {
                path: path.clone(),
                source,
            })?;
        file.lock_exclusive()
            .map_err(|source| StoreError::Lock { path, source })?;
        Ok(UpdateGuard::locked(file))
    }
}

/// In-memory backend for tests and dry runs.
#[derive(Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateBackend for MemoryBackend {
    fn load(&self, domain: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records().get(domain).cloned())
    }

    fn store(&self, domain: &str, contents: &str) -> Result<(), StoreError> {
        self.records()
            .insert(domain.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, domain: &str) -> Result<(), StoreError> {
        self.records().remove(domain);
        Ok(())
    }
}

/// Typed access to state domains over an injected backend.
pub struct StateStore {
    backend: Box<dyn StateBackend>,
}

impl StateStore {
    /// Wrap any backend.
    pub fn new(backend: impl StateBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Open a file-backed store rooted at `state_dir`.
    pub fn open(state_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(FileBackend::new(state_dir)?))
    }

    /// A store that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Load a domain. A missing or corrupt record is the domain default.
    ///
    /// A storage failure (the record exists but cannot be read) is returned
    /// for critical domains; non-critical domains log it and use the default.
    pub fn try_get<D: Domain>(&self) -> Result<D, StoreError> {
        let raw = match self.backend.load(D::NAME) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(D::default()),
            Err(e) if D::CRITICAL => return Err(e),
            Err(e) => {
                tracing::warn!(domain = D::NAME, error = %e, "state record unreadable, using default");
                return Ok(D::default());
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(domain = D::NAME, error = %e, "state record corrupt, using default");
                Ok(D::default())
            }
        }
    }

    /// Load a domain for display. Never fails; storage errors are logged.
    pub fn get<D: Domain>(&self) -> D {
        self.try_get().unwrap_or_else(|e| {
            tracing::warn!(domain = D::NAME, error = %e, "state record unreadable, using default");
            D::default()
        })
    }

    /// Persist a domain value, replacing the stored record.
    pub fn put<D: Domain>(&self, value: &D) -> Result<(), StoreError> {
        let result = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Serialization {
                domain: D::NAME.to_string(),
                source,
            })
            .and_then(|json| self.backend.store(D::NAME, &json));
        settle::<D>(result)
    }

    /// Load a domain, apply `mutate`, persist, and return the new value.
    pub fn update<D: Domain>(&self, mutate: impl FnOnce(&mut D)) -> Result<D, StoreError> {
        let _guard = match self.backend.begin_update() {
            Ok(guard) => guard,
            Err(e) => {
                settle::<D>(Err(e))?;
                UpdateGuard::unlocked()
            }
        };
        let mut value = self.try_get::<D>()?;
        mutate(&mut value);
        self.put(&value)?;
        Ok(value)
    }

    /// Clear a domain back to its default.
    pub fn reset<D: Domain>(&self) -> Result<(), StoreError> {
        let result = self.backend.remove(D::NAME);
        if result.is_ok() {
            tracing::debug!(domain = D::NAME, "state domain reset");
        }
        settle::<D>(result)
    }
}

/// Apply the domain's criticality to a storage result.
fn settle<D: Domain>(result: Result<(), StoreError>) -> Result<(), StoreError> {
    match result {
        Err(e) if !D::CRITICAL => {
            tracing::warn!(domain = D::NAME, error = %e, "ignoring storage failure for non-critical domain");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
    }

    impl Domain for Counter {
        const NAME: &'static str = "counter";
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Telemetry {
        hits: u32,
    }

    impl Domain for Telemetry {
        const NAME: &'static str = "telemetry";
        const CRITICAL: bool = false;
    }

    /// Backend whose writes always fail, like a full disk.
    struct FullDisk;

    impl StateBackend for FullDisk {
        fn load(&self, _domain: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn store(&self, domain: &str, _contents: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from(domain),
                source: std::io::Error::new(std::io::ErrorKind::Other, "no space left"),
            })
        }
        fn remove(&self, _domain: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn missing_domain_loads_default() {
        let store = StateStore::in_memory();
        assert_eq!(store.get::<Counter>(), Counter::default());
    }

    #[test]
    fn update_persists_and_returns_new_value() {
        let store = StateStore::in_memory();
        let updated = store.update::<Counter>(|c| c.value += 2).unwrap();
        assert_eq!(updated.value, 2);
        let again = store.update::<Counter>(|c| c.value += 1).unwrap();
        assert_eq!(again.value, 3);
        assert_eq!(store.get::<Counter>().value, 3);
    }

    #[test]
    fn reset_restores_default() {
        let store = StateStore::in_memory();
        store.put(&Counter { value: 9 }).unwrap();
        store.reset::<Counter>().unwrap();
        assert_eq!(store.get::<Counter>().value, 0);
    }

    #[test]
    fn corrupt_record_falls_back_to_default() {
        let backend = MemoryBackend::new();
        backend.store("counter", "{ not json").unwrap();
        let store = StateStore::new(backend);
        assert_eq!(store.get::<Counter>(), Counter::default());
        // And the next update overwrites the corrupt record cleanly.
        store.update::<Counter>(|c| c.value = 4).unwrap();
        assert_eq!(store.get::<Counter>().value, 4);
    }

    #[test]
    fn storage_failure_propagates_for_critical_domain() {
        let store = StateStore::new(FullDisk);
        let result = store.update::<Counter>(|c| c.value += 1);
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn storage_failure_is_swallowed_for_telemetry_domain() {
        let store = StateStore::new(FullDisk);
        let result = store.update::<Telemetry>(|t| t.hits += 1);
        assert_eq!(result.unwrap().hits, 1);
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = StateStore::open(dir.path().join("state")).unwrap();
            store.update::<Counter>(|c| c.value = 7).unwrap();
        }
        let store = StateStore::open(dir.path().join("state")).unwrap();
        assert_eq!(store.get::<Counter>().value, 7);
        assert!(dir.path().join("state/counter.json").exists());
        assert!(!dir.path().join("state/.counter.json.tmp").exists());
    }

    #[test]
    fn file_backend_corrupt_file_is_default() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        fs::write(backend.record_path("counter"), "\u{0}garbage").unwrap();
        let store = StateStore::new(backend);
        assert_eq!(store.get::<Counter>(), Counter::default());
    }

    #[test]
    fn unreadable_record_propagates_for_critical_domain_only() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path()).unwrap();
        // A directory where the record file should be fails to read.
        fs::create_dir(backend.record_path("counter")).unwrap();
        fs::create_dir(backend.record_path("telemetry")).unwrap();
        let store = StateStore::new(backend);

        match store.try_get::<Counter>() {
            Err(StoreError::Io { path, .. }) => assert!(path.ends_with("counter.json")),
            other => panic!("expected Io error, got {:?}", other),
        }
        assert!(store.update::<Counter>(|c| c.value = 1).is_err());
        assert_eq!(store.try_get::<Telemetry>().unwrap(), Telemetry::default());
        assert_eq!(store.get::<Counter>(), Counter::default());
    }

    #[test]
    fn file_backend_reset_missing_is_ok() {
        let dir = tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        store.reset::<Counter>().unwrap();
    }
}
