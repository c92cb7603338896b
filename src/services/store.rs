//! Durable key-value stores
//!
//! Stores never fail towards their caller: read anomalies look like a
//! missing key and write failures are logged.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{debug, warn};

/// String key-value store with `get`/`set`/`delete`
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(key.to_string(), value);
            }
            Err(e) => warn!("Failed to lock memory store: {}", e),
        }
    }

    fn delete(&self, key: &str) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(key);
            }
            Err(e) => warn!("Failed to lock memory store: {}", e),
        }
    }
}

/// Store persisted as a single JSON object on disk
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("Failed to read store file {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed store file {}: {}", self.path.display(), e);
            HashMap::new()
        })
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| format!("Failed to serialize store: {}", e))?;

        // Write to a sibling first so readers never see a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to replace {}: {}", self.path.display(), e))?;

        debug!("Store file {} saved with {} keys", self.path.display(), entries.len());
        Ok(())
    }

    fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Failed to lock store file {}: {}", self.path.display(), e);
                return;
            }
        };

        let mut entries = self.load();
        if !updater(&mut entries) {
            return;
        }

        if let Err(e) = self.save(&entries) {
            warn!("{}", e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: String) {
        self.update(|entries| {
            entries.insert(key.to_string(), value);
            true
        });
    }

    fn delete(&self, key: &str) {
        self.update(|entries| entries.remove(key).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("otp-timer", "value".to_string());
        assert_eq!(other.get("otp-timer").as_deref(), Some("value"));

        other.delete("otp-timer");
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");

        FileStore::new(&path).set("otp-timer", "{\"a\":1}".to_string());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("otp-timer").as_deref(), Some("{\"a\":1}"));

        reopened.delete("otp-timer");
        assert_eq!(FileStore::new(&path).get("otp-timer"), None);
        Ok(())
    }

    #[test]
    fn file_store_treats_garbage_as_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all")?;

        let store = FileStore::new(&path);
        assert_eq!(store.get("otp-timer"), None);

        // A write replaces the garbage with a valid object
        store.set("otp-timer", "x".to_string());
        assert_eq!(store.get("otp-timer").as_deref(), Some("x"));
        Ok(())
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.get("anything"), None);
        store.delete("anything");
        assert!(!store.path().exists());
        Ok(())
    }
}
