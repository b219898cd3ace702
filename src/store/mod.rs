//! Owned state containers the UI renders from.
//!
//! Each store holds its state behind a `tokio::sync::watch` channel: callers
//! read a snapshot, subscribe for changes, and request operations. Nothing
//! outside a store mutates its state.

pub mod auth_store;
pub mod prefs;
pub mod todo_store;

use crate::ops::validate::ValidationError;
use crate::service::ServiceError;

pub use auth_store::{AuthSnapshot, AuthStore};
pub use prefs::{PreferenceStore, ThemeStore, ViewStore};
pub use todo_store::{TodoSnapshot, TodoStore};

/// Why a store operation failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Rejected before reaching the service; state untouched
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Todo not found")]
    NotFound(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}
