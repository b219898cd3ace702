use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap};

use crate::tui::app::{App, Dialog, HitTarget};
use crate::tui::text_field::TextField;
use crate::util::unicode;

use super::helpers::{add_hitbox, centered_rect_fixed, field_spans, right_aligned};

const DIALOG_WIDTH: u16 = 56;
const CANCEL_LABEL: &str = "[ Cancel ]";

/// Render the open dialog centered over `area`
pub fn render_dialog(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(dialog) = app.dialog.clone() else {
        return;
    };
    match dialog {
        Dialog::Add { field, error } => {
            render_title_dialog(frame, app, area, "Add New Todo", &field, error.as_deref(), "[ Add ]")
        }
        Dialog::Edit { field, error, .. } => {
            render_title_dialog(frame, app, area, "Edit Todo", &field, error.as_deref(), "[ Save ]")
        }
        Dialog::Delete { title, .. } => render_delete_dialog(frame, app, area, &title),
    }
}

fn dialog_block<'a>(app: &App, title: &'a str, accent: ratatui::style::Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(app.theme.text_bright)
                .add_modifier(Modifier::BOLD),
        ))
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(app.theme.surface))
}

/// Add / edit: label, one-line input, validation error, buttons
fn render_title_dialog(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    title: &str,
    field: &TextField,
    error: Option<&str>,
    confirm: &str,
) {
    let popup = centered_rect_fixed(DIALOG_WIDTH.min(area.width.saturating_sub(4)), 9, area);
    let block = dialog_block(app, title, app.theme.highlight);
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);
    if inner.height < 4 || inner.width < 4 {
        return;
    }
    let bg = app.theme.surface;

    frame.render_widget(
        Paragraph::new(Span::styled(
            "Todo Title",
            Style::default().fg(app.theme.text).bg(bg),
        )),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );

    let input = Rect::new(inner.x, inner.y + 1, inner.width, 3);
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.selection_border))
        .style(Style::default().bg(app.theme.background));
    let input_inner = input_block.inner(input);
    frame.render_widget(input_block, input);
    let spans = field_spans(
        field,
        input_inner.width as usize,
        true,
        Style::default().fg(app.theme.text_bright),
        Style::default().fg(app.theme.highlight),
    );
    frame.render_widget(Paragraph::new(Line::from(spans)), input_inner);

    if let Some(error) = error
        && inner.height > 5
    {
        frame.render_widget(
            Paragraph::new(Span::styled(
                unicode::truncate_to_width(error, inner.width as usize),
                Style::default().fg(app.theme.red).bg(bg),
            )),
            Rect::new(inner.x, inner.y + 4, inner.width, 1),
        );
    }

    let buttons = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
    render_buttons(
        frame,
        app,
        buttons,
        confirm,
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
}

fn render_delete_dialog(frame: &mut Frame, app: &mut App, area: Rect, title: &str) {
    let width = DIALOG_WIDTH.min(area.width.saturating_sub(4));
    let message = format!("Are you sure you want to delete \"{}\"?", title);
    // Borders and padding take four columns
    let text_width = width.saturating_sub(4).max(1) as usize;
    let message_rows = unicode::display_width(&message).div_ceil(text_width).clamp(1, 3) as u16;
    let popup = centered_rect_fixed(width, message_rows + 4, area);
    let block = dialog_block(app, "Delete Todo", app.theme.red);
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);
    if inner.height < 2 || inner.width == 0 {
        return;
    }
    let bg = app.theme.surface;

    frame.render_widget(
        Paragraph::new(Span::styled(
            message,
            Style::default().fg(app.theme.text_bright).bg(bg),
        ))
        .wrap(Wrap { trim: true }),
        Rect::new(inner.x, inner.y, inner.width, inner.height - 1),
    );

    let buttons = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
    render_buttons(
        frame,
        app,
        buttons,
        "[ Delete ]",
        Style::default()
            .fg(app.theme.red)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    );
}

/// Cancel and the confirm button, right-aligned on `row`
fn render_buttons(frame: &mut Frame, app: &mut App, row: Rect, confirm: &str, confirm_style: Style) {
    let cancel_style = Style::default().fg(app.theme.text).bg(app.theme.surface);
    let items = [
        (CANCEL_LABEL, HitTarget::DialogCancel, cancel_style),
        (confirm, HitTarget::DialogConfirm, confirm_style),
    ];
    let widths: Vec<u16> = items
        .iter()
        .map(|(label, _, _)| unicode::display_width(label) as u16)
        .collect();
    let rects = right_aligned(row, &widths, 2);
    for ((label, target, style), rect) in items.into_iter().zip(rects) {
        let Some(rect) = rect else { continue };
        frame.render_widget(Paragraph::new(Span::styled(label.to_string(), style)), rect);
        add_hitbox(app, rect, target);
    }
}
