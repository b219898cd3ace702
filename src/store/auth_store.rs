use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;

use super::StoreError;
use crate::model::{Session, User};
use crate::ops::validate;
use crate::service::AuthService;

/// Shown when sign-up succeeds but the account must be confirmed first
pub const CONFIRM_EMAIL_NOTICE: &str = "Check your email to confirm your account, then sign in.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    /// The persisted session has been checked
    pub initialized: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Non-error outcome to show the user, e.g. a pending confirmation
    pub notice: Option<String>,
}

impl AuthSnapshot {
    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// Session state for the UI, kept in sync with the auth service's
/// change notifications once initialized
pub struct AuthStore {
    service: Arc<dyn AuthService>,
    state: Arc<watch::Sender<AuthSnapshot>>,
    listening: AtomicBool,
}

impl AuthStore {
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        AuthStore {
            service,
            state: Arc::new(state),
            listening: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Restore (and refresh) the persisted session, then follow session
    /// changes. Must be called inside a tokio runtime.
    pub async fn initialize(&self) {
        self.state.send_modify(|s| s.is_loading = true);
        let result = self.service.get_session().await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            s.initialized = true;
            match result {
                Ok(session) => s.session = session,
                Err(e) => {
                    tracing::warn!(error = %e, "could not restore session");
                    s.session = None;
                    s.error = Some(e.to_string());
                }
            }
        });

        if !self.listening.swap(true, Ordering::SeqCst) {
            let mut changes = self.service.subscribe();
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                loop {
                    match changes.recv().await {
                        Ok(change) => {
                            let session = change.session().cloned();
                            state.send_if_modified(|s| {
                                let changed = s.session != session;
                                s.session = session;
                                changed
                            });
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "auth listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), StoreError> {
        let email = validate::sign_in_form(email, password)?;
        self.run(async {
            let session = self.service.sign_in(&email, password).await?;
            Ok::<_, StoreError>(Some(session))
        })
        .await
    }

    /// Register, then sign straight in with the same credentials. When the
    /// service returns no user the account awaits email confirmation, so
    /// no sign-in is attempted and a notice is set instead.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), StoreError> {
        let email = validate::sign_up_form(email, password, confirm)?;
        self.run(async {
            if self.service.sign_up(&email, password).await?.is_none() {
                tracing::info!("signed up; awaiting email confirmation");
                return Ok(None);
            }
            tracing::info!("signed up; signing in");
            let session = self.service.sign_in(&email, password).await?;
            Ok::<_, StoreError>(Some(session))
        })
        .await
    }

    pub async fn sign_out(&self) -> Result<(), StoreError> {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
        let result = self.service.sign_out().await.map_err(StoreError::from);
        self.state.send_modify(|s| {
            s.is_loading = false;
            match &result {
                Ok(()) => s.session = None,
                Err(e) => s.error = Some(e.to_string()),
            }
        });
        result
    }

    /// Dismiss the last error and any notice
    pub fn clear_error(&self) {
        self.state
            .send_if_modified(|s| s.error.take().is_some() | s.notice.take().is_some());
    }

    async fn run<F>(&self, op: F) -> Result<(), StoreError>
    where
        F: std::future::Future<Output = Result<Option<Session>, StoreError>>,
    {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
            s.notice = None;
        });
        let result = op.await;
        self.state.send_modify(|s| {
            s.is_loading = false;
            match &result {
                Ok(Some(session)) => s.session = Some(session.clone()),
                Ok(None) => s.notice = Some(CONFIRM_EMAIL_NOTICE.to_string()),
                Err(e) => s.error = Some(e.to_string()),
            }
        });
        if let Ok(Some(session)) = &result {
            tracing::info!(user = %session.user.id, "signed in");
        }
        result.map(|_| ())
    }
}
