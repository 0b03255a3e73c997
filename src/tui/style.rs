//! Color constants and map colouring helpers for the TUI.

use ratatui::style::Color;

use crate::render::scale::{ColorScale, Rgb};

/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Border of the focused filter list.
pub const FOCUS_BORDER: Color = Color::Yellow;
/// Highlighted list entry.
pub const HIGHLIGHT_FG: Color = Color::Black;
/// Highlighted list entry background.
pub const HIGHLIGHT_BG: Color = Color::Yellow;
/// Regions without data for the current selection.
pub const NO_DATA: Color = Color::DarkGray;
/// Warning text.
pub const WARNING_FG: Color = Color::Magenta;

/// Converts a scale colour into a terminal colour.
pub fn rgb(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Map colour of a region holding `value`, or [`NO_DATA`] when absent.
pub fn region_color(scale: ColorScale, value: Option<f64>, max: f64) -> Color {
    match value {
        Some(v) => rgb(scale.color_for(v, max)),
        None => NO_DATA,
    }
}
