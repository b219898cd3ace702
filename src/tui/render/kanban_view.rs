use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::gesture::CardTransform;
use crate::model::Column;
use crate::tui::app::{App, HitTarget};
use crate::util::unicode;

use super::helpers::{add_hitbox, offset_rect};
use super::render_message;

/// Rows per card including its border
const CARD_HEIGHT: u16 = 3;

/// A card laid out at its resting position, drawn after all columns
struct CardSlot {
    id: String,
    title: String,
    completed: bool,
    selected: bool,
    base: Rect,
    transform: CardTransform,
}

/// Two columns, Pending and Completed, each a stack of cards. Cards are
/// drawn after both columns so a dragged card stays on top while it
/// crosses into the other one.
pub fn render_kanban_view(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.todos.todos.is_empty() && app.todos.is_loading {
        render_message(frame, app, area, "Loading\u{2026}");
        return;
    }

    let columns = Layout::horizontal([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .spacing(1)
        .split(area);

    let mut cards = Vec::new();
    for (column, &col_area) in Column::all().into_iter().zip(columns.iter()) {
        let inner = render_column(frame, app, column, col_area);
        cards.extend(layout_cards(app, column, inner));
    }

    // Stable sort keeps column order among cards at rest
    cards.sort_by_key(|c| c.transform.z_index);
    for card in cards {
        render_card(frame, app, card, area);
    }
}

/// Column frame, heading and empty-state text. Returns the card area.
fn render_column(frame: &mut Frame, app: &App, column: Column, area: Rect) -> Rect {
    let style = app.board.column_style(column);
    let count = app.column_todos(column).len();
    // Only the live drop target gets the heavy border; the scale pulse
    // cannot be drawn in cells
    let (border_type, border_color) = if style.border_highlight {
        (BorderType::Thick, app.theme.drop_target)
    } else {
        (BorderType::Rounded, app.theme.dim)
    };
    let title_color = if style.opacity < 1.0 {
        app.theme.dim
    } else {
        app.theme.text_bright
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            format!(" {} ({}) ", column.title(), count),
            Style::default().fg(title_color).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(app.theme.background));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if count == 0 && inner.height > 0 {
        let message = match column {
            Column::Pending => "No pending todos",
            Column::Completed => "No completed todos",
        };
        let rect = Rect::new(inner.x, inner.y + inner.height / 2, inner.width, 1);
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(app.theme.dim)))
                .alignment(Alignment::Center),
            rect,
        );
    }
    inner
}

/// Resting rects for the cards of one column, scrolled so the selected
/// card is visible
fn layout_cards(app: &App, column: Column, inner: Rect) -> Vec<CardSlot> {
    let visible = (inner.height / CARD_HEIGHT) as usize;
    if visible == 0 || inner.width == 0 {
        return Vec::new();
    }
    let todos = app.column_todos(column);
    let selected_idx = app
        .selected
        .as_deref()
        .and_then(|id| todos.iter().position(|t| t.id == id));
    let offset = selected_idx.map_or(0, |i| (i + 1).saturating_sub(visible));

    todos
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, t)| CardSlot {
            id: t.id.clone(),
            title: t.title.clone(),
            completed: t.completed,
            selected: Some(i) == selected_idx,
            base: Rect::new(
                inner.x,
                inner.y + (i - offset) as u16 * CARD_HEIGHT,
                inner.width,
                CARD_HEIGHT,
            ),
            transform: app.board.transform(&t.id),
        })
        .collect()
}

fn render_card(frame: &mut Frame, app: &mut App, card: CardSlot, bounds: Rect) {
    let t = card.transform;
    if t.opacity < 0.2 {
        return;
    }
    let dx = (t.translate_x / app.ui.cell_width).round() as i32;
    let dy = (t.translate_y / app.ui.cell_height).round() as i32;
    let width = (f32::from(card.base.width) * t.scale).round() as u16;
    let Some(rect) = offset_rect(card.base, dx, dy, width, bounds) else {
        return;
    };

    let faded = t.opacity < 0.6;
    let dragged = app.board.dragging() == Some(card.id.as_str());
    let (border_type, border_color) = if t.deleting {
        (BorderType::Thick, app.theme.red)
    } else if dragged {
        (BorderType::Thick, app.theme.highlight)
    } else if card.selected {
        (BorderType::Thick, app.theme.selection_border)
    } else {
        (BorderType::Rounded, app.theme.dim)
    };
    let border_color = if faded { app.theme.dim } else { border_color };
    let bg = if card.selected && !dragged {
        app.theme.selection_bg
    } else {
        app.theme.surface
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(bg));
    let inner = block.inner(rect);
    frame.render_widget(Clear, rect);
    frame.render_widget(block, rect);

    let mut title_style = Style::default().bg(bg).fg(if faded || card.completed {
        app.theme.dim
    } else {
        app.theme.text_bright
    });
    if card.completed {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
    }
    let title = unicode::truncate_to_width(&card.title, inner.width as usize);
    frame.render_widget(Paragraph::new(Line::from(Span::styled(title, title_style))), inner);

    add_hitbox(app, rect, HitTarget::Card(card.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Point, PointerEvent};
    use crate::model::ViewMode;
    use crate::tui::render::test_helpers::*;
    use std::time::{Duration, Instant};

    fn kanban_app() -> App {
        let mut app = app_with_todos(vec![
            todo("a", "Buy milk", false),
            todo("b", "Walk dog", true),
        ]);
        app.set_view(ViewMode::Kanban);
        app
    }

    fn card_rect(app: &App, id: &str) -> Option<Rect> {
        app.hitboxes
            .iter()
            .find(|h| h.target == HitTarget::Card(id.into()))
            .map(|h| h.area)
    }

    #[test]
    fn columns_show_titles_counts_and_cards() {
        let mut app = kanban_app();
        let out = render_to_string(60, 10, |frame, area| {
            render_kanban_view(frame, &mut app, area)
        });
        assert!(out.contains("Pending (1)"));
        assert!(out.contains("Completed (1)"));
        assert!(out.contains("Buy milk"));
        assert!(out.contains("Walk dog"));
        // Pending on the left, Completed on the right
        let first = out.lines().next().unwrap_or_default();
        assert!(first.find("Pending").unwrap_or(usize::MAX) < first.find("Completed").unwrap_or(0));
    }

    #[test]
    fn empty_column_has_placeholder() {
        let mut app = app_with_todos(vec![todo("a", "Buy milk", false)]);
        app.set_view(ViewMode::Kanban);
        let out = render_to_string(60, 10, |frame, area| {
            render_kanban_view(frame, &mut app, area)
        });
        assert!(out.contains("Completed (0)"));
        assert!(out.contains("No completed todos"));
        assert!(!out.contains("No pending todos"));
    }

    #[test]
    fn cards_register_hitboxes_inside_their_column() {
        let mut app = kanban_app();
        render_to_string(60, 10, |frame, area| render_kanban_view(frame, &mut app, area));
        assert_eq!(card_rect(&app, "a").map(|r| (r.x, r.y, r.height)), Some((1, 1, 3)));
        assert_eq!(app.hit_test(3, 2), Some(&HitTarget::Card("a".into())));
        let b = card_rect(&app, "b");
        assert!(b.is_some_and(|r| r.x > 30));
    }

    #[test]
    fn dragged_card_follows_the_pointer() {
        let mut app = kanban_app();
        let now = Instant::now();
        let start = Point::new(40.0, 16.0);
        app.pointer(Some("a"), PointerEvent::Down(start), now);
        app.pointer(
            None,
            PointerEvent::Move(Point::new(120.0, 16.0)),
            now + Duration::from_millis(16),
        );
        assert_eq!(app.board.dragging(), Some("a"));
        render_to_string(60, 10, |frame, area| render_kanban_view(frame, &mut app, area));
        // 80 points at 8 points per column
        assert_eq!(card_rect(&app, "a").map(|r| r.x), Some(11));
        // Dragged card is drawn (and hit-tested) last
        assert_eq!(
            app.hitboxes.last().map(|h| h.target.clone()),
            Some(HitTarget::Card("a".into()))
        );
    }

    #[test]
    fn only_the_current_drop_target_has_a_heavy_border() {
        let mut app = kanban_app();
        let mut now = Instant::now();
        let frame_step = Duration::from_millis(16);
        let heavy_corners = |app: &mut App| {
            let out = render_to_string(60, 10, |frame, area| {
                render_kanban_view(frame, app, area)
            });
            // Column borders are on the first row; cards start below
            out.lines().next().unwrap_or_default().matches('\u{250F}').count()
        };

        app.pointer(Some("a"), PointerEvent::Down(Point::new(40.0, 16.0)), now);
        now += frame_step;
        app.pointer(None, PointerEvent::Move(Point::new(200.0, 16.0)), now);
        for _ in 0..10 {
            now += frame_step;
            app.tick(now, frame_step);
        }
        assert_eq!(app.board.drop_target(), Some(Column::Completed));
        assert_eq!(heavy_corners(&mut app), 1);

        // Swing back past the other threshold; Completed is still settling
        now += frame_step;
        app.pointer(None, PointerEvent::Move(Point::new(-80.0, 16.0)), now);
        assert_eq!(app.board.drop_target(), Some(Column::Pending));
        assert_eq!(heavy_corners(&mut app), 1);
        for _ in 0..10 {
            now += frame_step;
            app.tick(now, frame_step);
        }

        now += frame_step;
        app.pointer(None, PointerEvent::Up(Point::new(40.0, 16.0)), now);
        assert_eq!(app.board.drop_target(), None);
        assert_eq!(heavy_corners(&mut app), 0);
    }

    #[test]
    fn many_cards_scroll_to_selection() {
        let todos = (0..8)
            .map(|i| todo(&format!("t{}", i), &format!("Todo {}", i), false))
            .collect();
        let mut app = app_with_todos(todos);
        app.set_view(ViewMode::Kanban);
        app.selected = Some("t6".into());
        let out = render_to_string(60, 11, |frame, area| {
            render_kanban_view(frame, &mut app, area)
        });
        // Three cards fit in nine inner rows
        assert!(out.contains("Todo 6"));
        assert!(out.contains("Todo 4"));
        assert!(!out.contains("Todo 3"));
    }
}
