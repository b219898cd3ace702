use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use unicode_segmentation::UnicodeSegmentation;

use crate::tui::app::{App, HitTarget, Hitbox};
use crate::tui::text_field::TextField;
use crate::util::unicode;

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}

/// A `width` x `height` rect centered in `area`, shrunk to fit
pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Place items of the given widths right-aligned on the row of `area`,
/// `gap` cells apart. Items that don't fit are dropped from the left.
pub(super) fn right_aligned(area: Rect, widths: &[u16], gap: u16) -> Vec<Option<Rect>> {
    let mut out = vec![None; widths.len()];
    let mut right = area.x + area.width;
    for (i, &w) in widths.iter().enumerate().rev() {
        let needed = if i + 1 == widths.len() { w } else { w + gap };
        if right < area.x + needed {
            break;
        }
        right -= needed;
        out[i] = Some(Rect::new(right, area.y, w, 1));
    }
    out
}

/// Rect of `base` moved by a signed cell offset and resized to `width`,
/// clipped to `bounds`. None if nothing of it is visible.
pub(super) fn offset_rect(base: Rect, dx: i32, dy: i32, width: u16, bounds: Rect) -> Option<Rect> {
    let grow = i32::from(width) - i32::from(base.width);
    let x = i32::from(base.x) + dx - grow / 2;
    let y = i32::from(base.y) + dy;
    let left = x.max(i32::from(bounds.x));
    let top = y.max(i32::from(bounds.y));
    let right = (x + i32::from(width)).min(i32::from(bounds.x + bounds.width));
    let bottom = (y + i32::from(base.height)).min(i32::from(bounds.y + bounds.height));
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

/// Spans for a single-line text field `width` cells wide. When focused the
/// text scrolls to keep the cursor visible; the cell under the cursor is
/// reversed, or a bar is drawn past the end.
pub(super) fn field_spans(
    field: &TextField,
    width: usize,
    focused: bool,
    text_style: Style,
    cursor_style: Style,
) -> Vec<Span<'static>> {
    let display = field.display();
    if !focused {
        return vec![Span::styled(
            unicode::truncate_to_width(&display, width),
            text_style,
        )];
    }
    if width == 0 {
        return Vec::new();
    }

    let col = field.display_cursor();
    let (visible, skipped) = unicode::scroll_to_col(&display, col, width);
    let cursor_col = col - skipped;
    let mut at = 0;
    let split = visible
        .grapheme_indices(true)
        .find(|(_, g)| {
            let here = at;
            at += unicode::display_width(g);
            here >= cursor_col
        })
        .map_or(visible.len(), |(i, _)| i);
    let (before, rest) = visible.split_at(split);
    let mut graphemes = rest.graphemes(true);
    let under = graphemes.next();
    let after: String = graphemes.collect();

    let mut spans = vec![Span::styled(before.to_string(), text_style)];
    let used = unicode::display_width(before);
    let under_w = match under {
        Some(g) => {
            spans.push(Span::styled(
                g.to_string(),
                text_style.add_modifier(Modifier::REVERSED),
            ));
            unicode::display_width(g)
        }
        None => {
            spans.push(Span::styled("\u{258C}", cursor_style));
            1
        }
    };
    let room = width.saturating_sub(used + under_w);
    if room > 0 && !after.is_empty() {
        spans.push(Span::styled(
            unicode::truncate_to_width(&after, room),
            text_style,
        ));
    }
    spans
}

pub(super) fn add_hitbox(app: &mut App, area: Rect, target: HitTarget) {
    if area.width > 0 && area.height > 0 {
        app.hitboxes.push(Hitbox { area, target });
    }
}
