use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::ViewMode;
use crate::tui::app::{App, Screen};

use super::helpers::spans_width;

/// Render the status row (bottom of screen): activity and counts on the
/// left, key hints for the current context on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = Vec::new();
    if app.is_loading() {
        spans.push(Span::styled(
            " Loading\u{2026}",
            Style::default().fg(app.theme.highlight).bg(bg),
        ));
    } else if app.screen() == Screen::Todos {
        let done = app.todos.todos.iter().filter(|t| t.completed).count();
        let pending = app.todos.todos.len() - done;
        spans.push(Span::styled(
            format!(" {} pending, {} completed", pending, done),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let hint = match app.screen() {
        Screen::Loading => "q quit",
        Screen::Auth => "Tab next  Enter submit  Ctrl-N switch  Esc quit",
        Screen::Todos if app.dialog.is_some() => "Enter confirm  Esc cancel",
        Screen::Todos => match app.view_mode() {
            ViewMode::List => "a add  e edit  space toggle  d delete  v view  t theme  q quit",
            ViewMode::Kanban => "a add  e edit  h/l column  space toggle  d delete  v view  q quit",
        },
    };
    // Hint goes only if it fits after the left side
    let content_width = spans_width(&spans);
    let hint_width = hint.chars().count() + 1;
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
