use xi_rope::Rope;

use super::span::Span;

/// Extracts the text for a span from the rope as an owned String.
///
/// This allocates; prefer working with spans where possible.
pub fn slice_to_string(rope: &Rope, sp: Span) -> String {
    rope.slice_to_cow(sp.start..sp.end).into_owned()
}

/// Extracts text for a span, truncating to `max` characters with "..." suffix
/// if needed.
///
/// Used for log and diagnostic messages.
pub fn preview(rope: &Rope, sp: Span, max: usize) -> String {
    let s = slice_to_string(rope, sp);
    if s.chars().count() > max {
        let mut truncated: String = s.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    } else {
        s
    }
}
