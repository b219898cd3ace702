use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, Dialog};

/// Keys while a modal dialog is open
pub(super) fn handle_dialog(app: &mut App, key: KeyEvent) {
    let is_delete = matches!(app.dialog, Some(Dialog::Delete { .. }));
    match key.code {
        KeyCode::Enter => app.submit_dialog(),
        KeyCode::Esc => app.cancel_dialog(),
        KeyCode::Char('y') if is_delete => app.submit_dialog(),
        KeyCode::Char('n') if is_delete => app.cancel_dialog(),
        _ => {
            if let Some(field) = app.dialog_field_mut() {
                field.handle_key(key);
            }
        }
    }
}
