//! Remote collaborators: the todo data service and the auth service.
//!
//! Both are traits so the stores can run against the hosted Supabase
//! backend or the local JSON-file backend interchangeably.

pub mod local;
pub mod session;
pub mod supabase;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::io::storage::LocalStorage;
use crate::model::{AppConfig, AuthChange, Backend, NewTodo, Session, Todo, TodoPatch, User};

pub use local::LocalBackend;
pub use session::SessionHolder;
pub use supabase::SupabaseClient;

/// Errors surfaced by a backend, already phrased for humans
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("User not authenticated")]
    NotAuthenticated,
    /// Rejected by the auth service (bad credentials, duplicate user, ...)
    #[error("{0}")]
    Auth(String),
    /// Error response from the data API
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("service not configured: {0}")]
    NotConfigured(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Data API for the `todos` table, scoped to the signed-in user
#[async_trait]
pub trait TodoService: Send + Sync {
    /// The signed-in user, or `NotAuthenticated`
    async fn current_user(&self) -> ServiceResult<User>;
    /// All of the user's todos, newest first
    async fn select_todos(&self) -> ServiceResult<Vec<Todo>>;
    async fn insert_todo(&self, todo: NewTodo) -> ServiceResult<()>;
    /// Update one field. Unknown ids match nothing and succeed.
    async fn update_todo(&self, id: &str, patch: TodoPatch) -> ServiceResult<()>;
    /// Delete by id. Unknown ids match nothing and succeed.
    async fn delete_todo(&self, id: &str) -> ServiceResult<()>;
}

/// Email/password authentication with a persisted, refreshable session
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a user. Returns the created user when the service reports one.
    async fn sign_up(&self, email: &str, password: &str) -> ServiceResult<Option<User>>;
    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session>;
    async fn sign_out(&self) -> ServiceResult<()>;
    /// Current session, refreshed first if the access token expired
    async fn get_session(&self) -> ServiceResult<Option<Session>>;
    /// Session-change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// The pair of services one backend provides
#[derive(Clone)]
pub struct Services {
    pub todos: Arc<dyn TodoService>,
    pub auth: Arc<dyn AuthService>,
}

/// Build the configured backend. Sessions persist in `home`.
pub fn connect(config: &AppConfig, home: &Path) -> ServiceResult<Services> {
    let storage = LocalStorage::new(home);
    match config.service.backend {
        Backend::Local => {
            let backend = Arc::new(LocalBackend::open(
                home.join(&config.service.data_file),
                Some(storage),
            ));
            tracing::info!(data_file = %config.service.data_file, "using local backend");
            Ok(Services {
                todos: backend.clone(),
                auth: backend,
            })
        }
        Backend::Supabase => {
            let url = config
                .service
                .url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| ServiceError::NotConfigured("service.url is not set".into()))?;
            let anon_key = config
                .service
                .anon_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| ServiceError::NotConfigured("service.anon_key is not set".into()))?;
            let client = Arc::new(SupabaseClient::new(url, anon_key, Some(storage)));
            tracing::info!(url, "using supabase backend");
            Ok(Services {
                todos: client.clone(),
                auth: client,
            })
        }
    }
}
