use serde::{Deserialize, Serialize};

/// How the todo collection is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Kanban,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Kanban,
            ViewMode::Kanban => ViewMode::List,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Kanban => "kanban",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "list" => Some(ViewMode::List),
            "kanban" => Some(ViewMode::Kanban),
            _ => None,
        }
    }
}

/// Persisted view preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPrefs {
    #[serde(default)]
    pub view_mode: ViewMode,
}

/// Persisted theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePrefs {
    #[serde(default = "default_dark")]
    pub is_dark_mode: bool,
}

impl Default for ThemePrefs {
    fn default() -> Self {
        ThemePrefs { is_dark_mode: true }
    }
}

fn default_dark() -> bool {
    true
}
