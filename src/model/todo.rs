use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A todo row as the data service returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Server-assigned opaque identifier
    pub id: String,
    /// Owner; never shown in the UI
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// The kanban column this todo is displayed in
    pub fn column(&self) -> Column {
        Column::for_completed(self.completed)
    }
}

/// Insert payload. `completed` is always false at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTodo {
    pub title: String,
    pub user_id: String,
}

/// Update payload: exactly one field changes per update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TodoPatch {
    Completed { completed: bool },
    Title { title: String },
}

/// The two kanban columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Pending,
    Completed,
}

impl Column {
    pub fn for_completed(completed: bool) -> Self {
        if completed {
            Column::Completed
        } else {
            Column::Pending
        }
    }

    /// Column heading shown above the cards
    pub fn title(self) -> &'static str {
        match self {
            Column::Pending => "Pending",
            Column::Completed => "Completed",
        }
    }

    /// Left-to-right display order
    pub fn all() -> [Column; 2] {
        [Column::Pending, Column::Completed]
    }
}
