//! Key-value stores backing the TTL cache.
//!
//! Stores hold opaque strings; expiry lives one layer up in
//! [`crate::cache::TtlCache`].

use crate::errors::CacheError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// A string-keyed, string-valued store.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;

    fn keys(&self) -> Vec<String>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Store persisted as a single JSON object on disk.
///
/// The whole map is loaded on open and written back on every change, so
/// entries survive across invocations of the CLI.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable or corrupt one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable cache file {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        debug!("Opened cache file {} ({} entries)", path.display(), entries.len());

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<HashMap<String, String>, CacheError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let Ok(mut entries) = self.entries.lock() else {
            return Ok(());
        };
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").is_none());
        store.set("k", "v".to_string()).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert_eq!(store.keys(), vec!["k".to_string()]);
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let store = FileStore::open(&path);
        store.set("profile_octocat", "{}".to_string()).unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("profile_octocat").as_deref(), Some("{}"));

        reopened.remove("profile_octocat").unwrap();
        let again = FileStore::open(&path);
        assert!(again.get("profile_octocat").is_none());
    }

    #[test]
    fn test_file_store_discards_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert!(store.keys().is_empty());

        store.set("k", "v".to_string()).unwrap();
        assert_eq!(FileStore::open(&path).get("k").as_deref(), Some("v"));
    }
}
