use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::ViewMode;
use crate::tui::app::{App, HitTarget};
use crate::util::unicode;

use super::helpers::{add_hitbox, right_aligned, spans_width};

const ADD_LABEL: &str = "[+ Add]";
const SIGN_OUT_LABEL: &str = "Sign out";

/// Title bar: app name and user on the left; add button, view toggle,
/// theme toggle and sign-out on the right. Second row is a separator.
pub fn render_header(frame: &mut Frame, app: &mut App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let bg = app.theme.background;
    let row = Rect::new(area.x, area.y, area.width, 1);

    let mut left = vec![Span::styled(
        " My Todos",
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(email) = app.auth.user().and_then(|u| u.email.clone()) {
        left.push(Span::styled(
            format!("  {}", email),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(left.clone())).style(Style::default().bg(bg)),
        row,
    );

    let view = app.view_mode();
    let theme_label = if app.is_dark() {
        "\u{2600} Light"
    } else {
        "\u{263E} Dark"
    };
    let items: Vec<(String, HitTarget, Style)> = vec![
        (
            ADD_LABEL.to_string(),
            HitTarget::AddButton,
            Style::default().fg(app.theme.highlight).bg(bg),
        ),
        (
            " List ".to_string(),
            HitTarget::ViewMode(ViewMode::List),
            segment_style(app, view == ViewMode::List),
        ),
        (
            " Kanban ".to_string(),
            HitTarget::ViewMode(ViewMode::Kanban),
            segment_style(app, view == ViewMode::Kanban),
        ),
        (
            theme_label.to_string(),
            HitTarget::ThemeToggle,
            Style::default().fg(app.theme.text).bg(bg),
        ),
        (
            SIGN_OUT_LABEL.to_string(),
            HitTarget::SignOut,
            Style::default().fg(app.theme.text).bg(bg),
        ),
    ];

    // Leave room for the title; the segments sit flush against each other
    let title_width = spans_width(&left) as u16 + 2;
    let buttons_area = Rect::new(
        row.x + title_width.min(row.width),
        row.y,
        row.width.saturating_sub(title_width + 1),
        1,
    );
    let widths: Vec<u16> = items
        .iter()
        .map(|(label, _, _)| unicode::display_width(label) as u16)
        .collect();
    let rects = place_with_segments(buttons_area, &widths);
    for ((label, target, style), rect) in items.into_iter().zip(rects) {
        let Some(rect) = rect else { continue };
        frame.render_widget(Paragraph::new(Span::styled(label, style)), rect);
        add_hitbox(app, rect, target);
    }

    if area.height > 1 {
        let sep = Rect::new(area.x, area.y + 1, area.width, 1);
        frame.render_widget(
            Paragraph::new(Span::styled(
                "\u{2500}".repeat(area.width as usize),
                Style::default().fg(app.theme.dim).bg(bg),
            )),
            sep,
        );
    }
}

fn segment_style(app: &App, active: bool) -> Style {
    if active {
        Style::default()
            .fg(app.theme.background)
            .bg(app.theme.highlight)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.surface)
    }
}

/// Right-align the header items: gaps of 2 cells between groups, none
/// between the two view segments (items 1 and 2)
fn place_with_segments(area: Rect, widths: &[u16]) -> Vec<Option<Rect>> {
    let segmented = widths[1] + widths[2];
    let grouped = [widths[0], segmented, widths[3], widths[4]];
    let rects = right_aligned(area, &grouped, 2);
    let split = rects[1].map(|r| {
        (
            Rect::new(r.x, r.y, widths[1], 1),
            Rect::new(r.x + widths[1], r.y, widths[2], 1),
        )
    });
    vec![
        rects[0],
        split.map(|(a, _)| a),
        split.map(|(_, b)| b),
        rects[2],
        rects[3],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn header_shows_controls() {
        let mut app = app_with_todos(vec![]);
        let out = render_to_string(TERM_W, 2, |frame, area| {
            render_header(frame, &mut app, area)
        });
        let first = out.lines().next().unwrap_or_default();
        assert!(first.starts_with(" My Todos  ada@example.com"));
        assert!(first.contains("[+ Add]"));
        assert!(first.contains(" List  Kanban "));
        assert!(first.contains("\u{2600} Light"));
        assert!(first.ends_with("Sign out"));
        assert!(out.lines().nth(1).unwrap_or_default().starts_with("\u{2500}\u{2500}"));
    }

    #[test]
    fn header_hitboxes_cover_labels() {
        let mut app = app_with_todos(vec![]);
        render_to_string(TERM_W, 2, |frame, area| render_header(frame, &mut app, area));
        let sign_out = app
            .hitboxes
            .iter()
            .find(|h| h.target == HitTarget::SignOut)
            .map(|h| h.area);
        // One cell of right margin
        assert_eq!(sign_out, Some(Rect::new(TERM_W - 9, 0, 8, 1)));
        let kanban = app
            .hitboxes
            .iter()
            .find(|h| h.target == HitTarget::ViewMode(ViewMode::Kanban))
            .map(|h| h.area);
        let list = app
            .hitboxes
            .iter()
            .find(|h| h.target == HitTarget::ViewMode(ViewMode::List))
            .map(|h| h.area);
        match (list, kanban) {
            (Some(l), Some(k)) => assert_eq!(l.x + l.width, k.x),
            other => panic!("missing view segments: {:?}", other),
        }
    }

    #[test]
    fn light_theme_offers_dark() {
        let mut app = app_with_todos(vec![]);
        app.toggle_theme();
        let out = render_to_string(TERM_W, 2, |frame, area| {
            render_header(frame, &mut app, area)
        });
        assert!(out.contains("\u{263E} Dark"));
    }
}
