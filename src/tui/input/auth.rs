use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Request};

/// Sign-in / sign-up form keys
pub(super) fn handle_auth(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Tab) | (_, KeyCode::Down) => app.form.focus_next(),
        (_, KeyCode::BackTab) | (_, KeyCode::Up) => app.form.focus_prev(),
        (_, KeyCode::Enter) => {
            if !app.auth.is_loading {
                app.submit_auth();
            }
        }
        // Switch between sign-in and sign-up
        (m, KeyCode::Char('n')) if m.contains(KeyModifiers::CONTROL) => app.switch_auth_mode(),
        (_, KeyCode::Esc) => {
            if app.auth_error().is_some() {
                app.form.error = None;
                app.push(Request::ClearAuthError);
            } else {
                app.should_quit = true;
            }
        }
        _ => {
            if app.form.focused_mut().handle_key(key) {
                app.form.error = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UiConfig;
    use crate::store::{AuthSnapshot, ThemeStore, ViewStore};
    use crate::tui::app::{AuthField, AuthMode};

    fn auth_app() -> App {
        let mut app = App::new(UiConfig::default(), ViewStore::open(None), ThemeStore::open(None));
        app.set_auth(AuthSnapshot {
            initialized: true,
            ..Default::default()
        });
        app
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_auth(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn fill_and_submit_sign_in() {
        let mut app = auth_app();
        type_str(&mut app, "ada@example.com");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.form.focus, AuthField::Password);
        type_str(&mut app, "secret1");
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.take_requests(),
            vec![Request::SignIn {
                email: "ada@example.com".into(),
                password: "secret1".into(),
            }]
        );
    }

    #[test]
    fn empty_email_is_reported_inline() {
        let mut app = auth_app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.auth_error(), Some("Email is required"));
        assert!(app.take_requests().is_empty());

        // Typing clears the message
        type_str(&mut app, "a");
        assert_eq!(app.auth_error(), None);
    }

    #[test]
    fn ctrl_n_switches_to_sign_up() {
        let mut app = auth_app();
        handle_auth(
            &mut app,
            KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL),
        );
        assert_eq!(app.form.mode, AuthMode::SignUp);
        assert_eq!(app.form.fields().len(), 3);
    }

    #[test]
    fn no_submit_while_loading() {
        let mut app = auth_app();
        app.auth.is_loading = true;
        type_str(&mut app, "ada@example.com");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "secret1");
        press(&mut app, KeyCode::Enter);
        assert!(app.take_requests().is_empty());
    }
}
