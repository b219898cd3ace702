use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::StoreError;
use crate::model::{NewTodo, Todo, TodoPatch};
use crate::ops::validate;
use crate::service::TodoService;

/// What the UI renders from: the last successful read plus flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoSnapshot {
    /// Newest first, exactly as the service returned them
    pub todos: Vec<Todo>,
    pub is_loading: bool,
    /// Message of the last failed operation
    pub error: Option<String>,
}

impl TodoSnapshot {
    pub fn find(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }
}

/// Sole owner of the todo collection.
///
/// Every mutation is followed by a full refetch; the collection is never
/// patched locally. Overlapping operations each set and clear the loading
/// flag independently, so the last one to finish wins.
pub struct TodoStore {
    service: Arc<dyn TodoService>,
    state: watch::Sender<TodoSnapshot>,
}

impl TodoStore {
    pub fn new(service: Arc<dyn TodoService>) -> Self {
        let (state, _) = watch::channel(TodoSnapshot::default());
        TodoStore { service, state }
    }

    pub fn snapshot(&self) -> TodoSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoSnapshot> {
        self.state.subscribe()
    }

    /// Replace the collection with the service's current rows
    pub async fn fetch_all(&self) -> Result<(), StoreError> {
        self.run("fetch", async { Ok::<_, StoreError>(()) }).await
    }

    pub async fn add(&self, title: &str) -> Result<(), StoreError> {
        let title = validate::todo_title(title)?;
        self.run("add", async {
            let user = self.service.current_user().await?;
            self.service
                .insert_todo(NewTodo {
                    title,
                    user_id: user.id,
                })
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    /// Flip `completed` of a todo in the current snapshot
    pub async fn toggle(&self, id: &str) -> Result<(), StoreError> {
        let current = self.state.borrow().find(id).map(|t| t.completed);
        self.run("toggle", async {
            let completed = current.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            self.service
                .update_todo(
                    id,
                    TodoPatch::Completed {
                        completed: !completed,
                    },
                )
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.run("remove", async {
            self.service.delete_todo(id).await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    pub async fn edit(&self, id: &str, title: &str) -> Result<(), StoreError> {
        let title = validate::todo_title(title)?;
        self.run("edit", async {
            self.service
                .update_todo(id, TodoPatch::Title { title })
                .await?;
            Ok::<_, StoreError>(())
        })
        .await
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Forget everything, e.g. after sign-out
    pub fn clear(&self) {
        self.state.send_replace(TodoSnapshot::default());
    }

    /// Loading on, error off, run `op`, refetch on success, record the
    /// message on failure, loading off
    async fn run<F>(&self, op: &'static str, mutation: F) -> Result<(), StoreError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        let result = match mutation.await {
            Ok(()) => self.refetch().await,
            Err(e) => Err(e),
        };

        self.state.send_modify(|s| {
            s.is_loading = false;
            if let Err(e) = &result {
                s.error = Some(e.to_string());
            }
        });
        match &result {
            Ok(()) => tracing::debug!(op, "todo store operation finished"),
            Err(e) => tracing::warn!(op, error = %e, "todo store operation failed"),
        }
        result
    }

    async fn refetch(&self) -> Result<(), StoreError> {
        let todos = self.service.select_todos().await?;
        self.state.send_modify(|s| s.todos = todos);
        Ok(())
    }
}
