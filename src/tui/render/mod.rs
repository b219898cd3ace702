pub mod auth_form;
pub mod dialog;
pub mod header;
mod helpers;
pub mod kanban_view;
pub mod list_view;
pub mod status_row;
#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Wrap};

use crate::model::ViewMode;

use super::app::{App, Screen};

/// Draw one frame and rebuild the hitboxes
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    app.hitboxes.clear();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    match app.screen() {
        Screen::Loading => render_message(frame, app, chunks[0], "Loading\u{2026}"),
        Screen::Auth => auth_form::render_auth_form(frame, app, chunks[0]),
        Screen::Todos => render_todos(frame, app, chunks[0]),
    }

    status_row::render_status_row(frame, app, chunks[1]);
}

fn render_todos(frame: &mut Frame, app: &mut App, area: Rect) {
    // Layout: header (2 rows) | content
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    header::render_header(frame, app, chunks[0]);

    if let Some(error) = app.todos.error.clone() {
        render_error(frame, app, chunks[1], &error);
    } else {
        match app.view_mode() {
            ViewMode::List => list_view::render_list_view(frame, app, chunks[1]),
            ViewMode::Kanban => kanban_view::render_kanban_view(frame, app, chunks[1]),
        }
    }

    // Dialogs render on top of everything
    if app.dialog.is_some() {
        dialog::render_dialog(frame, app, area);
    }
}

/// Store error shown in place of the content
fn render_error(frame: &mut Frame, app: &App, area: Rect, message: &str) {
    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default()
                .fg(app.theme.red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Esc dismiss  r retry",
            Style::default().fg(app.theme.dim),
        )),
    ];
    let top = area.y + area.height.saturating_sub(3) / 2;
    let rect = Rect::new(area.x, top, area.width, area.height.min(3));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(app.theme.background));
    frame.render_widget(paragraph, rect);
}

/// A single dim line centered in `area`
pub(super) fn render_message(frame: &mut Frame, app: &App, area: Rect, message: &str) {
    if area.height == 0 {
        return;
    }
    let rect = Rect::new(area.x, area.y + area.height / 2, area.width, 1);
    let paragraph = Paragraph::new(Span::styled(
        message.to_string(),
        Style::default().fg(app.theme.dim),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(paragraph, rect);
}
