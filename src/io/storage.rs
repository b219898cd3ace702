use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

/// Storage key for the persisted auth session
pub const AUTH_SESSION_KEY: &str = "auth-session";
/// Storage key for the view-mode preference
pub const VIEW_KEY: &str = "view-storage";
/// Storage key for the theme preference
pub const THEME_KEY: &str = "theme-storage";

/// Error type for local key-value persistence
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not serialize {key}: {source}")]
    SerializeError {
        key: String,
        source: serde_json::Error,
    },
}

/// Directory-backed key-value store: one JSON file per key.
///
/// Reads are forgiving (missing or malformed files read as absent);
/// writes are atomic.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read and decode the value stored under `key`
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.path_for(key)).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring unreadable stored value");
                None
            }
        }
    }

    /// Encode and store `value` under `key`
    pub fn set_item<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let content =
            serde_json::to_string_pretty(value).map_err(|e| StorageError::SerializeError {
                key: key.to_string(),
                source: e,
            })?;
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir)
            .and_then(|_| atomic_write(&path, content.as_bytes()))
            .map_err(|e| StorageError::WriteError { path, source: e })
    }

    /// Delete the value under `key`. Missing keys are not an error.
    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteError { path, source: e }),
        }
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        mode: String,
    }

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage
            .set_item("prefs", &Prefs { mode: "kanban".into() })
            .unwrap();
        let loaded: Prefs = storage.get_item("prefs").unwrap();
        assert_eq!(loaded.mode, "kanban");
    }

    #[test]
    fn keys_are_independent() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.set_item(VIEW_KEY, &"kanban").unwrap();
        storage.set_item(AUTH_SESSION_KEY, &"token").unwrap();
        storage.remove_item(AUTH_SESSION_KEY).unwrap();
        assert_eq!(storage.get_item::<String>(VIEW_KEY).as_deref(), Some("kanban"));
        assert!(storage.get_item::<String>(AUTH_SESSION_KEY).is_none());
    }

    #[test]
    fn read_missing_key_returns_none() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.get_item::<Prefs>("nope").is_none());
        storage.remove_item("nope").unwrap();
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("prefs.json"), "not json {{{").unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.get_item::<Prefs>("prefs").is_none());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested/home"));
        storage.set_item("k", &1u32).unwrap();
        assert_eq!(storage.get_item::<u32>("k"), Some(1));
    }
}
