use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, broadcast};

use super::session::SessionHolder;
use super::{AuthService, ServiceError, ServiceResult, TodoService};
use crate::io::storage::{LocalStorage, atomic_write};
use crate::model::{AuthChange, NewTodo, Session, Todo, TodoPatch, User};
use crate::ops::validate::MIN_PASSWORD_LEN;

const DEFAULT_SESSION_TTL_SECS: i64 = 3600;
/// How long after its access token expires a refresh token still works
const REFRESH_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    todos: Vec<Todo>,
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: String,
    email: String,
    salt: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenRecord {
    access_token: String,
    refresh_token: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

impl TokenRecord {
    fn refreshable_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at + Duration::days(REFRESH_WINDOW_DAYS) > now
    }
}

/// Offline backend: users, tokens and todos in one JSON file (or only in
/// memory). Error messages match the hosted service's wording.
///
/// The file is re-read on every call so several `tdb` processes can share
/// it.
#[derive(Debug)]
pub struct LocalBackend {
    path: Option<PathBuf>,
    db: Mutex<Database>,
    session: SessionHolder,
    session_ttl: Duration,
}

impl LocalBackend {
    /// File-backed backend; sessions persist in `storage` when given
    pub fn open(path: PathBuf, storage: Option<LocalStorage>) -> Self {
        LocalBackend {
            path: Some(path),
            db: Mutex::new(Database::default()),
            session: SessionHolder::new(storage),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Memory-only backend, for tests
    pub fn in_memory() -> Self {
        LocalBackend {
            path: None,
            db: Mutex::new(Database::default()),
            session: SessionHolder::new(None),
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Override how long issued access tokens live
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    async fn read_db<R>(&self, f: impl FnOnce(&Database) -> ServiceResult<R>) -> ServiceResult<R> {
        let mut db = self.db.lock().await;
        if let Some(path) = &self.path {
            *db = load_db(path)?;
        }
        f(&db)
    }

    /// Run a mutation; the file is only written when `f` succeeds
    async fn write_db<R>(
        &self,
        f: impl FnOnce(&mut Database) -> ServiceResult<R>,
    ) -> ServiceResult<R> {
        let mut db = self.db.lock().await;
        if let Some(path) = &self.path {
            *db = load_db(path)?;
        }
        let result = f(&mut db)?;
        if let Some(path) = &self.path {
            save_db(path, &db)?;
        }
        Ok(result)
    }

    /// The current session, refreshed first if its access token expired
    async fn live_session(&self) -> ServiceResult<Session> {
        self.get_session()
            .await?
            .ok_or(ServiceError::NotAuthenticated)
    }

    /// The user owning the current session's access token
    fn session_user(&self, db: &Database) -> ServiceResult<User> {
        let session = self.session.current().ok_or(ServiceError::NotAuthenticated)?;
        let token = db
            .tokens
            .iter()
            .find(|t| t.access_token == session.access_token)
            .filter(|t| t.expires_at > Utc::now())
            .ok_or(ServiceError::NotAuthenticated)?;
        db.users
            .iter()
            .find(|u| u.id == token.user_id)
            .map(UserRecord::user)
            .ok_or(ServiceError::NotAuthenticated)
    }

    /// Issue a fresh token pair, dropping tokens past their refresh window
    fn issue_tokens(&self, db: &mut Database, user: &UserRecord) -> Session {
        let now = Utc::now();
        db.tokens.retain(|t| t.refreshable_at(now));
        let record = TokenRecord {
            access_token: uuid::Uuid::new_v4().simple().to_string(),
            refresh_token: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user.id.clone(),
            expires_at: now + self.session_ttl,
        };
        db.tokens.push(record.clone());
        Session {
            access_token: record.access_token,
            refresh_token: record.refresh_token,
            expires_at: record.expires_at,
            user: user.user(),
        }
    }
}

fn load_db(path: &Path) -> ServiceResult<Database> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text)
            .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Database::default()),
        Err(e) => Err(ServiceError::Storage(format!("{}: {}", path.display(), e))),
    }
}

fn save_db(path: &Path, db: &Database) -> ServiceResult<()> {
    let text = serde_json::to_string_pretty(db).map_err(|e| ServiceError::Storage(e.to_string()))?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    atomic_write(path, text.as_bytes())
        .map_err(|e| ServiceError::Storage(format!("{}: {}", path.display(), e)))
}

fn hash_password(salt: &str, password: &str) -> String {
    format!("{:x}", Sha256::digest(format!("{}:{}", salt, password).as_bytes()))
}

/// Creation time strictly after every existing todo, so newest-first
/// ordering is stable even for inserts within the same clock tick
fn next_created_at(db: &Database) -> DateTime<Utc> {
    let now = Utc::now();
    match db.todos.iter().map(|t| t.created_at).max() {
        Some(last) if last >= now => last + Duration::microseconds(1),
        _ => now,
    }
}

#[async_trait]
impl TodoService for LocalBackend {
    async fn current_user(&self) -> ServiceResult<User> {
        self.live_session().await?;
        self.read_db(|db| self.session_user(db)).await
    }

    async fn select_todos(&self) -> ServiceResult<Vec<Todo>> {
        self.live_session().await?;
        self.read_db(|db| {
            let user = self.session_user(db)?;
            let mut todos: Vec<Todo> = db
                .todos
                .iter()
                .filter(|t| t.user_id == user.id)
                .cloned()
                .collect();
            todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(todos)
        })
        .await
    }

    async fn insert_todo(&self, todo: NewTodo) -> ServiceResult<()> {
        self.live_session().await?;
        self.write_db(|db| {
            let user = self.session_user(db)?;
            if user.id != todo.user_id {
                return Err(ServiceError::Api {
                    status: 403,
                    message: "new row violates row-level security policy for table \"todos\""
                        .into(),
                });
            }
            let created_at = next_created_at(db);
            db.todos.push(Todo {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: todo.user_id,
                title: todo.title,
                completed: false,
                created_at,
                updated_at: created_at,
            });
            Ok(())
        })
        .await
    }

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> ServiceResult<()> {
        self.live_session().await?;
        self.write_db(|db| {
            let user = self.session_user(db)?;
            if let Some(todo) = db
                .todos
                .iter_mut()
                .find(|t| t.id == id && t.user_id == user.id)
            {
                match patch {
                    TodoPatch::Completed { completed } => todo.completed = completed,
                    TodoPatch::Title { title } => todo.title = title,
                }
                todo.updated_at = Utc::now();
            }
            Ok(())
        })
        .await
    }

    async fn delete_todo(&self, id: &str) -> ServiceResult<()> {
        self.live_session().await?;
        self.write_db(|db| {
            let user = self.session_user(db)?;
            db.todos.retain(|t| !(t.id == id && t.user_id == user.id));
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl AuthService for LocalBackend {
    async fn sign_up(&self, email: &str, password: &str) -> ServiceResult<Option<User>> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ServiceError::Auth(
                "Unable to validate email address: invalid format".into(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Auth(format!(
                "Password should be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        let user = self
            .write_db(|db| {
                if db.users.iter().any(|u| u.email == email) {
                    return Err(ServiceError::Auth("User already registered".into()));
                }
                let salt = uuid::Uuid::new_v4().simple().to_string();
                let record = UserRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    password_hash: hash_password(&salt, password),
                    salt,
                    email: email.clone(),
                    created_at: Utc::now(),
                };
                db.users.push(record.clone());
                Ok(record.user())
            })
            .await?;
        tracing::info!(user = %user.id, "registered local user");
        Ok(Some(user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<Session> {
        let email = email.trim().to_lowercase();
        let session = self
            .write_db(|db| {
                let user = db
                    .users
                    .iter()
                    .find(|u| u.email == email && u.password_hash == hash_password(&u.salt, password))
                    .cloned()
                    .ok_or_else(|| ServiceError::Auth("Invalid login credentials".into()))?;
                Ok(self.issue_tokens(db, &user))
            })
            .await?;
        self.session.publish(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> ServiceResult<()> {
        if let Some(session) = self.session.current() {
            self.write_db(|db| {
                db.tokens.retain(|t| t.access_token != session.access_token);
                Ok(())
            })
            .await?;
        }
        self.session.publish(AuthChange::SignedOut);
        Ok(())
    }

    async fn get_session(&self) -> ServiceResult<Option<Session>> {
        let Some(session) = self.session.current() else {
            return Ok(None);
        };
        if !session.is_expired() {
            let valid = self
                .read_db(|db| Ok(db.tokens.iter().any(|t| t.access_token == session.access_token)))
                .await?;
            if valid {
                return Ok(Some(session));
            }
            self.session.publish(AuthChange::SignedOut);
            return Ok(None);
        }

        let refreshed = self
            .write_db(|db| {
                let now = Utc::now();
                let Some(pos) = db
                    .tokens
                    .iter()
                    .position(|t| t.refresh_token == session.refresh_token && t.refreshable_at(now))
                else {
                    return Ok(None);
                };
                let old = db.tokens.remove(pos);
                let Some(user) = db.users.iter().find(|u| u.id == old.user_id).cloned() else {
                    return Ok(None);
                };
                Ok(Some(self.issue_tokens(db, &user)))
            })
            .await?;
        match refreshed {
            Some(session) => {
                self.session
                    .publish(AuthChange::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            None => {
                self.session.publish(AuthChange::SignedOut);
                Err(ServiceError::Auth(
                    "Invalid Refresh Token: Refresh Token Not Found".into(),
                ))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn signed_in(backend: &LocalBackend, email: &str) -> User {
        backend.sign_up(email, "secret123").await.unwrap();
        backend.sign_in(email, "secret123").await.unwrap().user
    }

    #[tokio::test]
    async fn crud_round_trip_newest_first() {
        let backend = LocalBackend::in_memory();
        let user = signed_in(&backend, "a@example.com").await;
        for title in ["first", "second", "third"] {
            backend
                .insert_todo(NewTodo {
                    title: title.into(),
                    user_id: user.id.clone(),
                })
                .await
                .unwrap();
        }
        let todos = backend.select_todos().await.unwrap();
        let titles: Vec<&str> = todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert!(todos.iter().all(|t| !t.completed));

        let id = todos[1].id.clone();
        backend
            .update_todo(&id, TodoPatch::Completed { completed: true })
            .await
            .unwrap();
        backend
            .update_todo(&id, TodoPatch::Title { title: "2nd".into() })
            .await
            .unwrap();
        backend.delete_todo(&todos[0].id).await.unwrap();

        let todos = backend.select_todos().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].title, "2nd");
        assert!(todos[0].completed);
    }

    #[tokio::test]
    async fn data_calls_require_session() {
        let backend = LocalBackend::in_memory();
        assert_eq!(
            backend.select_todos().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
        assert_eq!(
            backend.current_user().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn users_only_see_their_own_todos() {
        let backend = LocalBackend::in_memory();
        let alice = signed_in(&backend, "alice@example.com").await;
        backend
            .insert_todo(NewTodo {
                title: "alice's".into(),
                user_id: alice.id.clone(),
            })
            .await
            .unwrap();
        let alice_todo = backend.select_todos().await.unwrap()[0].id.clone();

        signed_in(&backend, "bob@example.com").await;
        assert!(backend.select_todos().await.unwrap().is_empty());
        // Bob cannot touch Alice's row
        backend.delete_todo(&alice_todo).await.unwrap();

        backend.sign_in("alice@example.com", "secret123").await.unwrap();
        assert_eq!(backend.select_todos().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn auth_errors_use_service_wording() {
        let backend = LocalBackend::in_memory();
        backend.sign_up("a@example.com", "secret123").await.unwrap();
        assert_eq!(
            backend.sign_up("A@example.com", "secret123").await.unwrap_err(),
            ServiceError::Auth("User already registered".into())
        );
        assert_eq!(
            backend.sign_in("a@example.com", "wrong-pass").await.unwrap_err(),
            ServiceError::Auth("Invalid login credentials".into())
        );
        assert_eq!(
            backend.sign_up("b@example.com", "12345").await.unwrap_err(),
            ServiceError::Auth("Password should be at least 6 characters.".into())
        );
        assert!(matches!(
            backend.sign_up("not-an-email", "secret123").await,
            Err(ServiceError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn password_floor_matches_form_validation() {
        let backend = LocalBackend::in_memory();
        let shortest = "x".repeat(MIN_PASSWORD_LEN);
        let too_short = "x".repeat(MIN_PASSWORD_LEN - 1);
        assert!(crate::ops::validate::sign_up_form("a@example.com", &shortest, &shortest).is_ok());
        assert!(backend.sign_up("a@example.com", &shortest).await.is_ok());
        assert!(crate::ops::validate::sign_up_form("b@example.com", &too_short, &too_short).is_err());
        assert!(backend.sign_up("b@example.com", &too_short).await.is_err());
    }

    #[tokio::test]
    async fn sign_out_invalidates_token_and_notifies() {
        let backend = LocalBackend::in_memory();
        let mut rx = backend.subscribe();
        signed_in(&backend, "a@example.com").await;
        backend.sign_out().await.unwrap();
        assert!(matches!(rx.try_recv().unwrap(), AuthChange::SignedIn(_)));
        assert_eq!(rx.try_recv().unwrap(), AuthChange::SignedOut);
        assert_eq!(backend.get_session().await.unwrap(), None);
        assert_eq!(
            backend.select_todos().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn expired_session_is_refreshed() {
        let backend = LocalBackend::in_memory().with_session_ttl(Duration::seconds(0));
        backend.sign_up("a@example.com", "secret123").await.unwrap();
        let first = backend.sign_in("a@example.com", "secret123").await.unwrap();
        let mut rx = backend.subscribe();

        let refreshed = backend.get_session().await.unwrap().unwrap();
        assert_ne!(refreshed.access_token, first.access_token);
        assert_ne!(refreshed.refresh_token, first.refresh_token);
        assert!(matches!(rx.try_recv().unwrap(), AuthChange::TokenRefreshed(_)));
    }

    #[tokio::test]
    async fn data_calls_refresh_an_expired_session() {
        let backend = LocalBackend::in_memory().with_session_ttl(Duration::seconds(1));
        let user = signed_in(&backend, "a@example.com").await;
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        backend
            .insert_todo(NewTodo {
                title: "after expiry".into(),
                user_id: user.id.clone(),
            })
            .await
            .unwrap();
        let todos = backend.select_todos().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "after expiry");
        assert_eq!(backend.current_user().await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn stale_tokens_are_pruned_when_issuing() {
        let backend = LocalBackend::in_memory()
            .with_session_ttl(-Duration::days(REFRESH_WINDOW_DAYS + 1));
        backend.sign_up("a@example.com", "secret123").await.unwrap();
        for _ in 0..3 {
            backend.sign_in("a@example.com", "secret123").await.unwrap();
        }
        assert_eq!(backend.db.lock().await.tokens.len(), 1);
        // Past the window the refresh token is gone too
        assert_eq!(
            backend.get_session().await.unwrap_err(),
            ServiceError::Auth("Invalid Refresh Token: Refresh Token Not Found".into())
        );
    }

    #[tokio::test]
    async fn recently_expired_tokens_survive_other_sign_ins() {
        let backend = LocalBackend::in_memory().with_session_ttl(Duration::seconds(0));
        backend.sign_up("a@example.com", "secret123").await.unwrap();
        backend.sign_up("b@example.com", "secret123").await.unwrap();
        backend.sign_in("a@example.com", "secret123").await.unwrap();
        backend.sign_in("b@example.com", "secret123").await.unwrap();
        assert_eq!(backend.db.lock().await.tokens.len(), 2);
    }

    #[tokio::test]
    async fn file_backend_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("local-db.json");
        let storage = LocalStorage::new(tmp.path());

        let first = LocalBackend::open(db_path.clone(), Some(storage.clone()));
        let user = signed_in(&first, "a@example.com").await;
        first
            .insert_todo(NewTodo {
                title: "persisted".into(),
                user_id: user.id,
            })
            .await
            .unwrap();

        // A second process restores the session and sees the row
        let second = LocalBackend::open(db_path, Some(storage));
        assert!(second.get_session().await.unwrap().is_some());
        let todos = second.select_todos().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "persisted");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_storage_error() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("local-db.json");
        fs::write(&db_path, "{ nope").unwrap();
        let backend = LocalBackend::open(db_path, None);
        assert!(matches!(
            backend.sign_in("a@example.com", "secret123").await,
            Err(ServiceError::Storage(_))
        ));
    }
}
