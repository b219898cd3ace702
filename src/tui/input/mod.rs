mod auth;
mod common;
mod dialog;
mod mouse;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent};

use super::app::{App, Screen};

use auth::handle_auth;
use common::{is_quit_chord, normalize_key};
use dialog::handle_dialog;
use navigate::handle_navigate;

pub use mouse::handle_mouse;

/// Handle a key event on the current screen
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    if is_quit_chord(&key) {
        app.should_quit = true;
        return;
    }

    let key = normalize_key(key);
    match app.screen() {
        Screen::Loading => {
            if key.code == KeyCode::Char('q') {
                app.should_quit = true;
            }
        }
        Screen::Auth => handle_auth(app, key),
        Screen::Todos if app.dialog.is_some() => handle_dialog(app, key),
        Screen::Todos => handle_navigate(app, key),
    }
}

/// Bracketed paste goes into whichever text field has focus
pub fn handle_paste(app: &mut App, text: &str) {
    match app.screen() {
        Screen::Auth => {
            app.form.error = None;
            app.form.focused_mut().insert_str(text);
        }
        Screen::Todos => {
            if let Some(field) = app.dialog_field_mut() {
                field.insert_str(text);
            }
        }
        Screen::Loading => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::app::{Dialog, Request};
    use crate::tui::render::test_helpers::{app_with_todos, todo};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_quits_even_in_dialog() {
        let mut app = app_with_todos(vec![]);
        app.open_add();
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn dialog_captures_typing() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        handle_key(&mut app, key(KeyCode::Char('a')));
        assert!(matches!(app.dialog, Some(Dialog::Add { .. })));
        // 'q' is text here, not quit
        for c in "quit".chars() {
            handle_key(&mut app, key(KeyCode::Char(c)));
        }
        assert!(!app.should_quit);
        handle_key(&mut app, key(KeyCode::Enter));
        assert!(app.dialog.is_none());
        assert_eq!(app.take_requests(), vec![Request::Add("quit".into())]);
    }

    #[test]
    fn paste_fills_dialog_field() {
        let mut app = app_with_todos(vec![]);
        app.open_add();
        handle_paste(&mut app, "Pasted title\n");
        match &app.dialog {
            Some(Dialog::Add { field, .. }) => assert_eq!(field.text(), "Pasted title"),
            other => panic!("expected add dialog, got {:?}", other),
        }
    }
}
