use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::util::unicode::{self, word_boundary_left, word_boundary_right};

/// Single-line text input with a byte-offset cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    buffer: String,
    cursor: usize,
    /// Render as bullets (password fields)
    pub masked: bool,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn masked() -> Self {
        TextField {
            masked: true,
            ..Self::default()
        }
    }

    /// A field pre-filled with `text`, cursor at the end
    pub fn with_text(text: &str) -> Self {
        TextField {
            buffer: text.to_string(),
            cursor: text.len(),
            masked: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// What the field shows: the text, or one bullet per grapheme when masked
    pub fn display(&self) -> String {
        if self.masked {
            "\u{2022}".repeat(unicode::grapheme_count(&self.buffer))
        } else {
            self.buffer.clone()
        }
    }

    /// Display column of the cursor within [`display`](Self::display)
    pub fn display_cursor(&self) -> usize {
        if self.masked {
            unicode::grapheme_count(&self.buffer[..self.cursor])
        } else {
            unicode::byte_offset_to_display_col(&self.buffer, self.cursor)
        }
    }

    pub fn insert_str(&mut self, text: &str) {
        // Pasted newlines would break a single-line field
        let text: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        self.buffer.insert_str(self.cursor, &text);
        self.cursor += text.len();
    }

    /// Apply an editing key. Returns false if the key is not an editing key,
    /// so the caller can treat it as a command.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match (key.modifiers, key.code) {
            // Ctrl+A / Home: start of line
            (m, KeyCode::Char('a')) if m.contains(KeyModifiers::CONTROL) => self.cursor = 0,
            (_, KeyCode::Home) => self.cursor = 0,
            // Ctrl+E / End: end of line
            (m, KeyCode::Char('e')) if m.contains(KeyModifiers::CONTROL) => {
                self.cursor = self.buffer.len();
            }
            (_, KeyCode::End) => self.cursor = self.buffer.len(),
            // Kill to start of line
            (m, KeyCode::Char('u')) if m.contains(KeyModifiers::CONTROL) => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
            // Kill previous word
            (m, KeyCode::Char('w')) if m.contains(KeyModifiers::CONTROL) => {
                self.delete_word_left();
            }
            (m, KeyCode::Backspace)
                if m.contains(KeyModifiers::ALT) || m.contains(KeyModifiers::CONTROL) =>
            {
                self.delete_word_left();
            }
            // Word movement (Alt+arrow, or readline Alt+B / Alt+F)
            (m, KeyCode::Left) if m.contains(KeyModifiers::ALT) => {
                self.cursor = word_boundary_left(&self.buffer, self.cursor);
            }
            (m, KeyCode::Right) if m.contains(KeyModifiers::ALT) => {
                self.cursor = word_boundary_right(&self.buffer, self.cursor);
            }
            (m, KeyCode::Char('b')) if m.contains(KeyModifiers::ALT) => {
                self.cursor = word_boundary_left(&self.buffer, self.cursor);
            }
            (m, KeyCode::Char('f')) if m.contains(KeyModifiers::ALT) => {
                self.cursor = word_boundary_right(&self.buffer, self.cursor);
            }
            (_, KeyCode::Left) => {
                if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
                    self.cursor = prev;
                }
            }
            (_, KeyCode::Right) => {
                if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
                    self.cursor = next;
                }
            }
            (_, KeyCode::Backspace) => {
                if let Some(prev) = unicode::prev_grapheme_boundary(&self.buffer, self.cursor) {
                    self.buffer.drain(prev..self.cursor);
                    self.cursor = prev;
                }
            }
            (_, KeyCode::Delete) => {
                if let Some(next) = unicode::next_grapheme_boundary(&self.buffer, self.cursor) {
                    self.buffer.drain(self.cursor..next);
                }
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            _ => return false,
        }
        true
    }

    fn delete_word_left(&mut self) {
        let start = word_boundary_left(&self.buffer, self.cursor);
        self.buffer.drain(start..self.cursor);
        self.cursor = start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(field: &mut TextField, code: KeyCode) -> bool {
        field.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(field: &mut TextField, c: char) -> bool {
        field.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_str(field: &mut TextField, s: &str) {
        for c in s.chars() {
            press(field, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_and_cursor_movement() {
        let mut f = TextField::new();
        type_str(&mut f, "milk");
        press(&mut f, KeyCode::Home);
        type_str(&mut f, "buy ");
        assert_eq!(f.text(), "buy milk");
        assert_eq!(f.cursor(), 4);
        press(&mut f, KeyCode::End);
        press(&mut f, KeyCode::Backspace);
        assert_eq!(f.text(), "buy mil");
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut f = TextField::with_text("cafe\u{301}");
        press(&mut f, KeyCode::Backspace);
        assert_eq!(f.text(), "caf");
    }

    #[test]
    fn ctrl_keys_edit_like_readline() {
        let mut f = TextField::with_text("walk the dog");
        ctrl(&mut f, 'w');
        assert_eq!(f.text(), "walk the ");
        ctrl(&mut f, 'a');
        assert_eq!(f.cursor(), 0);
        press(&mut f, KeyCode::Delete);
        assert_eq!(f.text(), "alk the ");
        ctrl(&mut f, 'e');
        ctrl(&mut f, 'u');
        assert!(f.is_empty());
    }

    #[test]
    fn command_keys_are_not_consumed() {
        let mut f = TextField::new();
        assert!(!press(&mut f, KeyCode::Enter));
        assert!(!press(&mut f, KeyCode::Esc));
        assert!(!press(&mut f, KeyCode::Tab));
        assert!(!ctrl(&mut f, 'n'));
    }

    #[test]
    fn masked_display_hides_text() {
        let mut f = TextField::masked();
        type_str(&mut f, "secret");
        assert_eq!(f.display(), "\u{2022}".repeat(6));
        assert_eq!(f.display_cursor(), 6);
        assert_eq!(f.text(), "secret");
    }

    #[test]
    fn paste_drops_newlines() {
        let mut f = TextField::new();
        f.insert_str("line one\nline two\r\n");
        assert_eq!(f.text(), "line oneline two");
    }
}
