use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::io::storage::{AUTH_SESSION_KEY, LocalStorage};
use crate::model::{AuthChange, Session};

const EVENT_CAPACITY: usize = 16;

/// In-memory session shared by a backend's auth and data halves, mirrored
/// to local storage and broadcast on every change
#[derive(Debug)]
pub struct SessionHolder {
    current: RwLock<Option<Session>>,
    storage: Option<LocalStorage>,
    events: broadcast::Sender<AuthChange>,
}

impl SessionHolder {
    /// Restore the persisted session, if any
    pub fn new(storage: Option<LocalStorage>) -> Self {
        let restored = storage
            .as_ref()
            .and_then(|s| s.get_item::<Session>(AUTH_SESSION_KEY));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        SessionHolder {
            current: RwLock::new(restored),
            storage,
            events,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a change: update memory, persist, notify subscribers
    pub fn publish(&self, change: AuthChange) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = change.session().cloned();
        if let Some(storage) = &self.storage {
            let result = match change.session() {
                Some(session) => storage.set_item(AUTH_SESSION_KEY, session),
                None => storage.remove_item(AUTH_SESSION_KEY),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "could not persist auth session");
            }
        }
        // No subscribers is fine
        let _ = self.events.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.events.subscribe()
    }
}
