//! Durable key-value storage
//!
//! The page kept everything in `localStorage`: string keys, string values.
//! `FileStorage` persists the same shape as one JSON object on disk so the CLI
//! keeps its login between runs; `MemoryStorage` backs tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use crate::error::{ClientError, ClientResult};
use crate::util::lock;

/// String-to-string storage with `localStorage` semantics
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
    /// Drop every key
    fn clear(&self) -> ClientResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        lock(&self.entries).clear();
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON file
// ─────────────────────────────────────────────────────────────────────────────

/// All keys in one JSON object file, rewritten on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }
        let json = serde_json::to_string_pretty(entries).context("Failed to serialize storage")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> ClientResult<()> {
        let _guard = lock(&self.write_lock);
        let mut entries = self.read_all().map_err(storage_error)?;
        f(&mut entries);
        self.write_all(&entries).map_err(storage_error)
    }
}

fn storage_error(err: anyhow::Error) -> ClientError {
    ClientError::Storage(format!("{:#}", err))
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.read_all().map_err(storage_error)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> ClientResult<()> {
        self.modify(BTreeMap::clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_basics() {
        let store = MemoryStorage::new();
        store.set("access", "a1").unwrap();
        assert_eq!(store.get("access").unwrap().as_deref(), Some("a1"));

        store.remove("access").unwrap();
        assert_eq!(store.get("access").unwrap(), None);

        store.set("x", "1").unwrap();
        store.set("y", "2").unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let store = FileStorage::new(&path);
        assert_eq!(store.get("access").unwrap(), None);
        store.set("access", "tok").unwrap();
        store.set("recentEmails", r#"["a@b.vn"]"#).unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("access").unwrap().as_deref(), Some("tok"));
        assert_eq!(
            reopened.get("recentEmails").unwrap().as_deref(),
            Some(r#"["a@b.vn"]"#)
        );

        reopened.remove("access").unwrap();
        assert_eq!(store.get("access").unwrap(), None);

        reopened.clear().unwrap();
        assert_eq!(store.get("recentEmails").unwrap(), None);
    }

    #[test]
    fn test_file_storage_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStorage::new(&path);
        assert!(matches!(store.get("access"), Err(ClientError::Storage(_))));
    }
}
