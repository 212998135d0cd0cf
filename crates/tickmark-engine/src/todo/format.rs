//! Conversion between the persisted checkbox form and the glyph form.
//!
//! On disk a todo is `- [ ] task` / `- [x] task`; while editing the
//! checkbox is swapped for the configured glyph. Only list items are touched,
//! fenced code is left alone, and malformed checkboxes (`[  ]`, `[]`) are
//! never converted.
//!
//! `[X]` stays as written: both glyphs are taken, so converting it would lose
//! the capital on the way back. Discovery reads it as checked either way.

use crate::parsing::fence::FenceTracker;
use crate::parsing::parse_list_marker;
use crate::position::char_to_byte;

use super::discovery::parse_todo_marker;
use super::{MarkerForm, MarkerGlyphs};

const UPPER_CHECKED: &str = "[X]";

fn convert(
    text: &str,
    glyphs: &MarkerGlyphs,
    from: MarkerForm,
    to: MarkerForm,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut fence = FenceTracker::default();

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\r', '\n']);
        let ending = &raw[line.len()..];

        let in_fence = fence.feed(line);
        let replacement = parse_list_marker(line)
            .filter(|_| !in_fence)
            .and_then(|list| {
                let at = char_to_byte(line, list.content_column);
                let (state, form, marker) = parse_todo_marker(&line[at..], glyphs)?;
                (form == from && marker != UPPER_CHECKED)
                    .then(|| (at, marker.len(), to.render(state, glyphs)))
            });

        match replacement {
            Some((at, len, marker)) => {
                out.push_str(&line[..at]);
                out.push_str(marker);
                out.push_str(&line[at + len..]);
            }
            None => out.push_str(line),
        }
        out.push_str(ending);
    }

    out
}

/// Replaces `[ ]` / `[x]` checkboxes with the configured glyphs.
pub fn to_glyphs(text: &str, glyphs: &MarkerGlyphs) -> String {
    convert(text, glyphs, MarkerForm::Checkbox, MarkerForm::Glyph)
}

/// Replaces glyphs with `[ ]` / `[x]` checkboxes for saving.
pub fn to_markdown(text: &str, glyphs: &MarkerGlyphs) -> String {
    convert(text, glyphs, MarkerForm::Glyph, MarkerForm::Checkbox)
}
