//! Key-value store backends
//!
//! `MemoryStore` backs tests and session-only hosts, `FileStore` persists one
//! file per key under a directory.

use crate::error::{CoreError, Result};
use crate::traits::KeyValueStore;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// In-memory key-value store
///
/// Size is measured as the sum of key and value lengths in bytes. The store can
/// be switched unavailable at runtime to emulate a disabled platform store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an unbounded, available store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes beyond `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Create a store whose every operation fails
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_available(false);
        store
    }

    /// Toggle availability
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Check if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::StoreUnavailable("memory store disabled".into()));
        }
        self.entries
            .lock()
            .map_err(|_| CoreError::storage("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(CoreError::QuotaExceeded { needed, available });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// File-backed key-value store
///
/// Each key maps to `<dir>/<key>.json`. Keys are restricted to
/// `[A-Za-z0-9._-]` so they cannot escape the directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: Option<usize>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self {
            dir,
            quota_bytes: None,
        })
    }

    /// Reject single values larger than `quota_bytes`
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Root directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            && !key.starts_with('.');
        if !valid {
            return Err(CoreError::invalid_input(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(CoreError::QuotaExceeded {
                    needed: value.len(),
                    available: quota,
                });
            }
        }

        // Write-then-rename so a crash never leaves a half-written entry
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.write_count(), 2);

        store.remove("k").unwrap();
        assert!(store.is_empty());
        // Removing twice is fine
        store.remove("k").unwrap();
    }

    #[test]
    fn memory_store_quota_counts_replaced_entry_once() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345678").unwrap(); // 9 bytes
        store.set("k", "abcdefgh").unwrap(); // replaces, still 9 bytes

        let err = store.set("other", "x").unwrap_err();
        assert!(matches!(err, CoreError::QuotaExceeded { .. }));
    }

    #[test]
    fn unavailable_memory_store_fails_everything() {
        let store = MemoryStore::unavailable();
        assert!(store.probe().is_err());
        assert!(store.get("k").is_err());
        assert!(matches!(
            store.set("k", "v"),
            Err(CoreError::StoreUnavailable(_))
        ));

        store.set_available(true);
        assert!(store.probe().is_ok());
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("state")).unwrap();

        assert_eq!(store.get("playback").unwrap(), None);
        store.set("playback", "{\"a\":1}").unwrap();
        assert_eq!(store.get("playback").unwrap().as_deref(), Some("{\"a\":1}"));

        store.remove("playback").unwrap();
        assert_eq!(store.get("playback").unwrap(), None);
        store.remove("playback").unwrap();
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(store.set("../escape", "x").is_err());
        assert!(store.set("a/b", "x").is_err());
        assert!(store.set("", "x").is_err());
        assert!(store.set(".hidden", "x").is_err());
    }

    #[test]
    fn file_store_quota() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap().with_quota(4);

        assert!(store.set("k", "1234").is_ok());
        assert!(matches!(
            store.set("k", "12345"),
            Err(CoreError::QuotaExceeded { .. })
        ));
        assert!(store.probe().is_ok());
    }
}
