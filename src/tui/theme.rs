use ratatui::style::Color;

use crate::model::UiConfig;

/// Parsed color theme for the TUI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    /// Cards, dialogs and the header bar
    pub surface: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub green: Color,
    pub selection_bg: Color,
    pub selection_border: Color,
    /// Column border while a dragged card hovers it
    pub drop_target: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            surface: Color::Rgb(0x1A, 0x0E, 0x2E),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            selection_border: Color::Rgb(0xFB, 0x41, 0x96),
            drop_target: Color::Rgb(0x44, 0xDD, 0xFF),
        }
    }

    pub fn light() -> Self {
        Theme {
            background: Color::Rgb(0xF5, 0xF5, 0xF7),
            surface: Color::Rgb(0xFF, 0xFF, 0xFF),
            text: Color::Rgb(0x3A, 0x3A, 0x4A),
            text_bright: Color::Rgb(0x00, 0x00, 0x00),
            highlight: Color::Rgb(0xC2, 0x18, 0x5B),
            dim: Color::Rgb(0x8E, 0x8E, 0x99),
            red: Color::Rgb(0xD3, 0x2F, 0x2F),
            green: Color::Rgb(0x2E, 0x7D, 0x32),
            selection_bg: Color::Rgb(0xF8, 0xD7, 0xE6),
            selection_border: Color::Rgb(0xC2, 0x18, 0x5B),
            drop_target: Color::Rgb(0x19, 0x76, 0xD2),
        }
    }

    /// The dark or light palette with `[ui.colors]` overrides applied.
    /// Overrides apply to both palettes.
    pub fn from_config(ui: &UiConfig, dark: bool) -> Self {
        let mut theme = if dark { Theme::dark() } else { Theme::light() };

        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "surface" => theme.surface = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "dim" => theme.dim = color,
                    "red" => theme.red = color,
                    "green" => theme.green = color,
                    "selection_bg" => theme.selection_bg = color,
                    "selection_border" => theme.selection_border = color,
                    "drop_target" => theme.drop_target = color,
                    _ => {}
                }
            }
        }

        theme
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}
