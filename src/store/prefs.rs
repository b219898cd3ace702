use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::io::storage::{LocalStorage, StorageError, THEME_KEY, VIEW_KEY};
use crate::model::{ThemePrefs, ViewMode, ViewPrefs};

const PERSIST_VERSION: u32 = 0;

/// On-disk envelope, shared with the mobile app's persisted stores
#[derive(Debug, Serialize, Deserialize)]
struct Persisted<T> {
    state: T,
    #[serde(default)]
    version: u32,
}

/// A small preference value read once at startup and written through on
/// every change
pub struct PreferenceStore<T> {
    key: &'static str,
    storage: Option<LocalStorage>,
    state: watch::Sender<T>,
}

pub type ViewStore = PreferenceStore<ViewPrefs>;
pub type ThemeStore = PreferenceStore<ThemePrefs>;

impl<T> PreferenceStore<T>
where
    T: Clone + PartialEq + Default + Serialize + DeserializeOwned,
{
    /// Load `key`; missing or unreadable values fall back to the default
    pub fn load(storage: Option<LocalStorage>, key: &'static str) -> Self {
        let initial = storage
            .as_ref()
            .and_then(|s| s.get_item::<Persisted<T>>(key))
            .map(|p| p.state)
            .unwrap_or_default();
        let (state, _) = watch::channel(initial);
        PreferenceStore {
            key,
            storage,
            state,
        }
    }

    pub fn get(&self) -> T {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Update in memory, then persist. The in-memory value changes even
    /// when the write fails.
    pub fn set(&self, value: T) -> Result<(), StorageError> {
        self.state.send_if_modified(|current| {
            let changed = *current != value;
            *current = value.clone();
            changed
        });
        match &self.storage {
            Some(storage) => storage.set_item(
                self.key,
                &Persisted {
                    state: value,
                    version: PERSIST_VERSION,
                },
            ),
            None => Ok(()),
        }
    }
}

impl ViewStore {
    pub fn open(storage: Option<LocalStorage>) -> Self {
        Self::load(storage, VIEW_KEY)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.get().view_mode
    }

    pub fn set_view_mode(&self, view_mode: ViewMode) -> Result<(), StorageError> {
        self.set(ViewPrefs { view_mode })
    }

    /// Switch list <-> kanban, returning the new mode
    pub fn toggle_view_mode(&self) -> Result<ViewMode, StorageError> {
        let next = self.view_mode().toggled();
        self.set_view_mode(next)?;
        Ok(next)
    }
}

impl ThemeStore {
    pub fn open(storage: Option<LocalStorage>) -> Self {
        Self::load(storage, THEME_KEY)
    }

    pub fn is_dark(&self) -> bool {
        self.get().is_dark_mode
    }

    pub fn set_dark(&self, is_dark_mode: bool) -> Result<(), StorageError> {
        self.set(ThemePrefs { is_dark_mode })
    }

    pub fn toggle_theme(&self) -> Result<bool, StorageError> {
        let next = !self.is_dark();
        self.set_dark(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn view_mode_persists_in_envelope() {
        let tmp = TempDir::new().unwrap();
        let store = ViewStore::open(Some(LocalStorage::new(tmp.path())));
        assert_eq!(store.view_mode(), ViewMode::List);
        assert_eq!(store.toggle_view_mode().unwrap(), ViewMode::Kanban);

        let raw = fs::read_to_string(tmp.path().join("view-storage.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"state": {"viewMode": "kanban"}, "version": 0})
        );

        let reopened = ViewStore::open(Some(LocalStorage::new(tmp.path())));
        assert_eq!(reopened.view_mode(), ViewMode::Kanban);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("theme-storage.json"), "not json").unwrap();
        let store = ThemeStore::open(Some(LocalStorage::new(tmp.path())));
        assert!(store.is_dark());
    }

    #[test]
    fn subscribers_only_see_real_changes() {
        let store = ThemeStore::open(None);
        let mut rx = store.subscribe();
        store.set_dark(true).unwrap();
        assert!(!rx.has_changed().unwrap());
        assert!(!store.toggle_theme().unwrap());
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_dark_mode);
    }
}
