//! Terminal display width helpers.
//!
//! Widths are measured after stripping ANSI escapes so padding stays aligned
//! when text carries styling.

use unicode_width::UnicodeWidthChar;

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Display width of a single character; control characters count as zero.
pub fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Cut `text` down to at most `max_width` columns, ending with `…` when
/// anything was dropped.
pub fn truncate_display(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let w = char_width(ch);
        if width + w >= max_width {
            break;
        }
        width += w;
        result.push(ch);
    }
    result.push('…');
    result
}
