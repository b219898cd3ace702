use std::time::Instant;

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::gesture::PointerEvent;
use crate::tui::app::{App, HitTarget, Request, Screen};

/// Route a mouse event: presses on kanban cards start a gesture, presses
/// anywhere else click the button under the pointer.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    let point = app.cell_to_point(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let Some(target) = app.hit_test(mouse.column, mouse.row).cloned() else {
                return;
            };
            match target {
                HitTarget::Card(id) => {
                    if app.dialog.is_none() {
                        app.pointer(Some(&id), PointerEvent::Down(point), now);
                    }
                }
                other => click(app, other),
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.pointer(None, PointerEvent::Move(point), now);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.pointer(None, PointerEvent::Up(point), now);
        }
        _ => {}
    }
}

fn click(app: &mut App, target: HitTarget) {
    let is_dialog_target = matches!(target, HitTarget::DialogConfirm | HitTarget::DialogCancel);
    // An open dialog is modal
    if app.dialog.is_some() != is_dialog_target {
        return;
    }
    match target {
        HitTarget::Card(_) => {}
        HitTarget::Row(id) => {
            app.selected = Some(id.clone());
            app.open_edit(&id);
        }
        HitTarget::Checkbox(id) => {
            app.selected = Some(id.clone());
            app.push(Request::Toggle(id));
        }
        HitTarget::RemoveButton(id) => {
            app.selected = Some(id.clone());
            app.open_delete(&id);
        }
        HitTarget::AddButton => app.open_add(),
        HitTarget::ViewMode(mode) => app.set_view(mode),
        HitTarget::ThemeToggle => app.toggle_theme(),
        HitTarget::SignOut => app.push(Request::SignOut),
        HitTarget::DialogConfirm => app.submit_dialog(),
        HitTarget::DialogCancel => app.cancel_dialog(),
        HitTarget::AuthField(field) => {
            if app.screen() == Screen::Auth {
                app.form.focus = field;
            }
        }
        HitTarget::AuthSubmit => {
            if !app.auth.is_loading {
                app.submit_auth();
            }
        }
        HitTarget::AuthSwitch => app.switch_auth_mode(),
    }
}
