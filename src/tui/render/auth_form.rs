use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph};

use crate::tui::app::{App, AuthField, AuthMode, HitTarget};
use crate::util::unicode;

use super::helpers::{add_hitbox, centered_rect_fixed, field_spans, spans_width};

const FORM_WIDTH: u16 = 48;
/// Label, input and spacer rows per field
const FIELD_ROWS: u16 = 3;

fn field_label(field: AuthField) -> &'static str {
    match field {
        AuthField::Email => "Email",
        AuthField::Password => "Password",
        AuthField::Confirm => "Confirm Password",
    }
}

/// Sign-in / sign-up card centered on the screen
pub fn render_auth_form(frame: &mut Frame, app: &mut App, area: Rect) {
    let fields = app.form.fields();
    // Top spacer, fields, error, button, spacer, switch line, borders
    let height = 1 + FIELD_ROWS * fields.len() as u16 + 4 + 2;
    let popup = centered_rect_fixed(FORM_WIDTH.min(area.width.saturating_sub(2)), height, area);

    let (title, button, busy, prompt, switch) = match app.form.mode {
        AuthMode::SignIn => (
            "Welcome Back",
            "[ Sign In ]",
            "Signing in\u{2026}",
            "Don't have an account? ",
            "Sign Up",
        ),
        AuthMode::SignUp => (
            "Create Account",
            "[ Sign Up ]",
            "Creating account\u{2026}",
            "Already have an account? ",
            "Sign In",
        ),
    };

    let bg = app.theme.surface;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.highlight))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(app.theme.text_bright)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .padding(Padding::horizontal(2))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    if inner.width < 4 {
        return;
    }
    let bottom = inner.y + inner.height;

    let mut y = inner.y + 1;
    for &field in fields {
        if y + 1 >= bottom {
            return;
        }
        let focused = app.form.focus == field;
        let label_style = if focused {
            Style::default().fg(app.theme.highlight).bg(bg)
        } else {
            Style::default().fg(app.theme.text).bg(bg)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(field_label(field), label_style)),
            Rect::new(inner.x, y, inner.width, 1),
        );

        let input_bg = if focused {
            app.theme.selection_bg
        } else {
            app.theme.background
        };
        let mut spans = vec![Span::raw(" ")];
        spans.extend(field_spans(
            app.form.field(field),
            inner.width.saturating_sub(2) as usize,
            focused,
            Style::default().fg(app.theme.text_bright),
            Style::default().fg(app.theme.highlight),
        ));
        let input = Rect::new(inner.x, y + 1, inner.width, 1);
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(input_bg)),
            input,
        );
        add_hitbox(
            app,
            Rect::new(inner.x, y, inner.width, 2),
            HitTarget::AuthField(field),
        );
        y += FIELD_ROWS;
    }

    let message = match (app.auth_error(), app.auth.notice.as_deref()) {
        (Some(error), _) => Some((error, app.theme.red)),
        (None, Some(notice)) => Some((notice, app.theme.green)),
        (None, None) => None,
    };
    if y < bottom
        && let Some((message, color)) = message
    {
        frame.render_widget(
            Paragraph::new(Span::styled(
                unicode::truncate_to_width(message, inner.width as usize),
                Style::default().fg(color).bg(bg),
            ))
            .alignment(Alignment::Center),
            Rect::new(inner.x, y, inner.width, 1),
        );
    }
    y += 1;

    if y < bottom {
        let (label, style) = if app.auth.is_loading {
            (busy, Style::default().fg(app.theme.dim).bg(bg))
        } else {
            (
                button,
                Style::default()
                    .fg(app.theme.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let rect = centered_row(inner, y, unicode::display_width(label) as u16);
        frame.render_widget(Paragraph::new(Span::styled(label, style)), rect);
        add_hitbox(app, rect, HitTarget::AuthSubmit);
    }
    y += 2;

    if y < bottom {
        let spans = vec![
            Span::styled(prompt, Style::default().fg(app.theme.dim).bg(bg)),
            Span::styled(
                switch,
                Style::default()
                    .fg(app.theme.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ];
        let rect = centered_row(inner, y, spans_width(&spans) as u16);
        frame.render_widget(Paragraph::new(Line::from(spans)), rect);
        add_hitbox(app, rect, HitTarget::AuthSwitch);
    }
}

/// A `width`-cell rect centered horizontally in `area` on row `y`
fn centered_row(area: Rect, y: u16, width: u16) -> Rect {
    let width = width.min(area.width);
    Rect::new(area.x + (area.width - width) / 2, y, width, 1)
}
