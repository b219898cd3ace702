use crossterm::event::{KeyCode, KeyEvent};

use crate::model::{Column, ViewMode};
use crate::tui::app::{App, Request};

/// Todo screen keys when no dialog is open
pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    let kanban = app.view_mode() == ViewMode::Kanban;
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            if app.todos.error.is_some() {
                app.push(Request::ClearTodoError);
            }
        }
        KeyCode::Char('r') => app.push(Request::Fetch),

        // Header actions
        KeyCode::Char('v') => app.toggle_view(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('L') => app.push(Request::SignOut),

        // Todo actions
        KeyCode::Char('a') => app.open_add(),
        KeyCode::Char('e') | KeyCode::Enter => app.edit_selected(),
        KeyCode::Char(' ') | KeyCode::Char('x') => app.toggle_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),

        // Cursor
        KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
        KeyCode::Char('g') | KeyCode::Home => app.move_selection(isize::MIN),
        KeyCode::Char('G') | KeyCode::End => app.move_selection(isize::MAX),
        KeyCode::Char('h') | KeyCode::Left if kanban => app.select_column(Column::Pending),
        KeyCode::Char('l') | KeyCode::Right if kanban => app.select_column(Column::Completed),
        _ => {}
    }
}
