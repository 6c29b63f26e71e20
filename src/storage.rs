//! Persistent key/value storage used by the cache and the token store.
//!
//! All storage access in the crate goes through the `Storage` trait so that
//! tests can substitute an in-memory implementation. The production
//! implementation keeps one JSON file per key inside a directory, which is
//! also what makes concurrent writers safe enough: writes are idempotent
//! whole-file overwrites of a single key, last write wins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Storage keys are restricted to this character set so they can double as
/// file names on every platform.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is not
    /// an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed storage, one `<key>.json` file per key.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            anyhow::bail!("Invalid storage key: {:?}", key);
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write storage entry: {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage entry: {}", key))?;
        }
        Ok(())
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Storage lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("missing").unwrap().is_none());

        storage.set("k", "v1").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v1"));

        // Overwrite, not append
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));

        storage.remove("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());

        // Removing a missing key is fine
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(storage.get("health").unwrap().is_none());
        storage.set("health", r#"{"ok":true}"#).unwrap();
        assert_eq!(
            storage.get("health").unwrap().as_deref(),
            Some(r#"{"ok":true}"#)
        );

        storage.remove("health").unwrap();
        assert!(storage.get("health").unwrap().is_none());
        assert!(!dir.path().join("health.json").exists());
    }

    #[test]
    fn test_file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("a/b").is_err());
        assert!(storage.set("", "x").is_err());
    }
}
