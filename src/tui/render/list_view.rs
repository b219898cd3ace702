use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, HitTarget};
use crate::util::unicode;

use super::helpers::add_hitbox;
use super::render_message;

const REMOVE_LABEL: &str = "[Remove]";
/// Columns before the title: margin, checkbox, space
const TITLE_X: u16 = 5;

/// One row per todo, newest first: checkbox, title, Remove button
pub fn render_list_view(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.todos.todos.is_empty() {
        let message = if app.todos.is_loading {
            "Loading\u{2026}"
        } else {
            "No todos yet. Add a new todo!"
        };
        render_message(frame, app, area, message);
        return;
    }
    if area.height == 0 {
        return;
    }

    // Keep the cursor row on screen
    let height = area.height as usize;
    let selected_idx = app
        .selected
        .as_deref()
        .and_then(|id| app.todos.todos.iter().position(|t| t.id == id))
        .unwrap_or(0);
    let offset = (selected_idx + 1).saturating_sub(height);

    let remove_w = REMOVE_LABEL.len() as u16;
    let rows: Vec<(String, String, bool, bool)> = app
        .todos
        .todos
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, t)| (t.id.clone(), t.title.clone(), t.completed, i == selected_idx))
        .collect();

    for (row_idx, (id, title, completed, is_selected)) in rows.into_iter().enumerate() {
        let y = area.y + row_idx as u16;
        let row = Rect::new(area.x, y, area.width, 1);
        let bg = if is_selected {
            app.theme.selection_bg
        } else {
            app.theme.background
        };

        let marker = if is_selected {
            Span::styled("\u{258C}", Style::default().fg(app.theme.selection_border).bg(bg))
        } else {
            Span::styled(" ", Style::default().bg(bg))
        };
        let checkbox = if completed {
            Span::styled("[x]", Style::default().fg(app.theme.green).bg(bg))
        } else {
            Span::styled("[ ]", Style::default().fg(app.theme.text).bg(bg))
        };
        let title_style = if completed {
            Style::default()
                .fg(app.theme.dim)
                .bg(bg)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(app.theme.text_bright).bg(bg)
        };
        let title_w = area.width.saturating_sub(TITLE_X + remove_w + 2) as usize;
        let mut spans = vec![
            marker,
            checkbox,
            Span::styled(" ", Style::default().bg(bg)),
            Span::styled(unicode::truncate_to_width(&title, title_w), title_style),
        ];
        let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
        let show_remove = area.width >= TITLE_X + remove_w + 2;
        let pad = (area.width as usize).saturating_sub(used + remove_w as usize + 1);
        if show_remove {
            spans.push(Span::styled(" ".repeat(pad), Style::default().bg(bg)));
            spans.push(Span::styled(
                REMOVE_LABEL,
                Style::default().fg(app.theme.red).bg(bg),
            ));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
            row,
        );

        // Row first so the buttons on top of it win hit tests
        add_hitbox(app, row, HitTarget::Row(id.clone()));
        add_hitbox(app, Rect::new(area.x + 1, y, 3, 1), HitTarget::Checkbox(id.clone()));
        if show_remove {
            let x = area.x + area.width - remove_w - 1;
            add_hitbox(app, Rect::new(x, y, remove_w, 1), HitTarget::RemoveButton(id));
        }
    }
}
