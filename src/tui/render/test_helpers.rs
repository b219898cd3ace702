use chrono::{Duration, TimeZone, Utc};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::{Session, Todo, UiConfig, User};
use crate::store::{AuthSnapshot, ThemeStore, TodoSnapshot, ViewStore};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// A todo owned by `u1` with a fixed timestamp
pub fn todo(id: &str, title: &str, completed: bool) -> Todo {
    let at = Utc.with_ymd_and_hms(2025, 5, 14, 9, 30, 0).unwrap();
    Todo {
        id: id.to_string(),
        user_id: "u1".into(),
        title: title.to_string(),
        completed,
        created_at: at,
        updated_at: at,
    }
}

/// An initialized auth snapshot with a live session for `user_id`
pub fn signed_in(user_id: &str) -> AuthSnapshot {
    AuthSnapshot {
        session: Some(Session {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: Utc::now() + Duration::hours(1),
            user: User {
                id: user_id.to_string(),
                email: Some("ada@example.com".into()),
            },
        }),
        initialized: true,
        is_loading: false,
        error: None,
        notice: None,
    }
}

/// A signed-in App on the todo screen, in-memory preferences, pending
/// requests drained.
pub fn app_with_todos(todos: Vec<Todo>) -> App {
    let mut app = App::new(
        UiConfig::default(),
        ViewStore::open(None),
        ThemeStore::open(None),
    );
    app.set_auth(signed_in("u1"));
    app.set_todos(TodoSnapshot {
        todos,
        ..Default::default()
    });
    app.take_requests();
    app
}
