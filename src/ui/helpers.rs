use std::ops::Range;

use anyhow::Error;
use ratatui::style::{Color, Style};
use tracing::Level;

/// Indices of the `height` lines to show from a list of `len` lines when the
/// view is scrolled `offset` lines up from the bottom.
pub(crate) fn tail_window(len: usize, height: usize, offset: usize) -> Range<usize> {
    let end = len.saturating_sub(offset);
    let start = end.saturating_sub(height);
    start..end
}

/// Slice of `input` that fits in `width` columns while keeping the cursor
/// (always at the end of the input) visible. Returns the visible text and the
/// cursor column relative to the start of the field.
pub(crate) fn input_window(input: &str, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }
    let chars: Vec<char> = input.chars().collect();
    // Leave one column for the cursor itself.
    let visible = width.saturating_sub(1).max(1);
    let skip = chars.len().saturating_sub(visible);
    let text: String = chars[skip..].iter().collect();
    let cursor = chars.len() - skip;
    (text, cursor)
}

/// Colour used for a diagnostic line.
pub(crate) fn level_style(level: Level) -> Style {
    match level {
        Level::ERROR => Style::default().fg(Color::Red),
        Level::WARN => Style::default().fg(Color::Yellow),
        Level::INFO => Style::default().fg(Color::Gray),
        _ => Style::default().fg(Color::DarkGray),
    }
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_window_follows_bottom_and_clamps() {
        assert_eq!(tail_window(10, 4, 0), 6..10);
        assert_eq!(tail_window(10, 4, 3), 3..7);
        assert_eq!(tail_window(10, 4, 50), 0..0);
        assert_eq!(tail_window(2, 4, 0), 0..2);
    }

    #[test]
    fn input_window_keeps_cursor_visible() {
        assert_eq!(input_window("SELECT", 20), ("SELECT".to_string(), 6));
        assert_eq!(input_window("SELECT", 4), ("ECT".to_string(), 3));
        assert_eq!(input_window("abc", 0), (String::new(), 0));
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to create aquarium.db");
        assert_eq!(surface_error(&err), "disk full");
    }
}
