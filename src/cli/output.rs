use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Column, Todo, User};

/// Characters of the id shown in human-readable listings
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub column: Column,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct TodoListJson {
    pub pending: usize,
    pub completed: usize,
    pub todos: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct UserJson {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct PreferenceJson<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

// ---------------------------------------------------------------------------
// Conversion functions
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo) -> TodoJson {
    TodoJson {
        id: todo.id.clone(),
        title: todo.title.clone(),
        completed: todo.completed,
        column: todo.column(),
        created_at: todo.created_at,
        updated_at: todo.updated_at,
    }
}

/// Counts are over the whole collection, `shown` is the filtered subset
pub fn todo_list_to_json(all: &[Todo], shown: &[&Todo]) -> TodoListJson {
    let completed = all.iter().filter(|t| t.completed).count();
    TodoListJson {
        pending: all.len() - completed,
        completed,
        todos: shown.iter().map(|t| todo_to_json(t)).collect(),
    }
}

pub fn user_to_json(user: &User) -> UserJson {
    UserJson {
        id: user.id.clone(),
        email: user.email.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Format a single todo as a one-line summary
pub fn format_todo_line(todo: &Todo) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    format!("[{}] {}  {}", mark, short_id(&todo.id), todo.title)
}

pub fn format_user(user: &User) -> String {
    match &user.email {
        Some(email) => format!("{} ({})", email, user.id),
        None => user.id.clone(),
    }
}

/// Footer under a listing, e.g. `3 pending, 1 completed`
pub fn format_counts(todos: &[Todo]) -> String {
    let completed = todos.iter().filter(|t| t.completed).count();
    format!("{} pending, {} completed", todos.len() - completed, completed)
}
