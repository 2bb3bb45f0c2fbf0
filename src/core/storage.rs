//! Durable local key-value persistence.
//!
//! Values are whole documents: every `set` replaces the previous value in one
//! step, so readers observe either the old or the new document.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::core::config::data::path_display;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
    Deserialize {
        key: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { path, source } => {
                write!(f, "Storage I/O failed at {}: {}", path_display(path), source)
            }
            StoreError::Serialize(source) => write!(f, "Failed to encode stored data: {source}"),
            StoreError::Deserialize { key, source } => {
                write!(f, "Stored value for '{key}' is corrupted: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Serialize(source) => Some(source),
            StoreError::Deserialize { source, .. } => Some(source),
        }
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<dir>/<key>.json`, written through a synced temp file
/// and an atomic rename.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(&path)(err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(Self::io_error(&self.dir))?;

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(Self::io_error(&self.dir))?;
        temp_file
            .write_all(value.as_bytes())
            .map_err(Self::io_error(&path))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(Self::io_error(&path))?;
        temp_file
            .persist(&path)
            .map_err(|err| Self::io_error(&path)(err.error))?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_missing_key_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileKeyValueStore::new(temp_dir.path());
        assert_eq!(store.get("chatHistory").expect("get"), None);
    }

    #[test]
    fn file_store_overwrites_whole_value() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileKeyValueStore::new(temp_dir.path().join("nested"));

        store.set("chatHistory", "[1,2,3]").expect("first set");
        store.set("chatHistory", "[]").expect("second set");

        assert_eq!(store.get("chatHistory").expect("get").as_deref(), Some("[]"));
        let on_disk = fs::read_to_string(temp_dir.path().join("nested/chatHistory.json"))
            .expect("read file");
        assert_eq!(on_disk, "[]");

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("nested"))
            .expect("read dir")
            .collect();
        assert_eq!(leftovers.len(), 1, "temp files must be renamed away");
    }

    #[test]
    fn file_store_sanitizes_key_names() {
        let store = FileKeyValueStore::new("/tmp/x");
        assert_eq!(
            store.path_for("../etc/passwd"),
            PathBuf::from("/tmp/x/___etc_passwd.json")
        );
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryKeyValueStore::new();
        store.set("a", "1").expect("set");
        assert_eq!(store.get("a").expect("get").as_deref(), Some("1"));
        assert_eq!(store.get("b").expect("get"), None);
    }
}
