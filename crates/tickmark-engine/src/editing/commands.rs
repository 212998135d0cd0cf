use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::Document;
use crate::error::EditError;
use crate::parsing::rope::Span;
use crate::position::{Position, Range, char_to_byte};

/// Commands that can be applied to the document. All positions are in
/// character coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Replaces `range` with `lines` joined by `\n`.
    SetText { range: Range, lines: Vec<String> },
    InsertText { at: Position, text: String },
    DeleteRange { range: Range },
    /// Swaps the todo marker `old` at `at` for `new`. Rejected if the text at
    /// `at` is no longer `old`.
    ReplaceMarker {
        at: Position,
        old: String,
        new: String,
    },
}

/// A command resolved against the current buffer.
pub(crate) struct Compiled {
    pub delta: Delta<RopeInfo>,
    pub changed: Range,
}

/// Compile a command into a delta
pub(crate) fn compile_command(doc: &Document, cmd: &Cmd) -> Result<Compiled, EditError> {
    match cmd {
        Cmd::SetText { range, lines } => replace(doc, *range, &lines.join("\n")),
        Cmd::InsertText { at, text } => replace(doc, Range::new(*at, *at), text),
        Cmd::DeleteRange { range } => replace(doc, *range, ""),
        Cmd::ReplaceMarker { at, old, new } => {
            doc.offset_of(*at)?;
            let line = doc.line(at.row).unwrap_or_default();
            let rest = &line[char_to_byte(&line, at.column)..];
            if !rest.starts_with(old.as_str()) {
                let found: String = rest.chars().take(old.chars().count()).collect();
                return Err(EditError::Rejected(format!(
                    "expected marker '{old}' at {at}, found '{found}'"
                )));
            }
            let end_pos = Position::new(at.row, at.column + old.chars().count());
            replace(doc, Range::new(*at, end_pos), new)
        }
    }
}

fn replace(doc: &Document, range: Range, text: &str) -> Result<Compiled, EditError> {
    let span = Span::new(doc.offset_of(range.start)?, doc.offset_of(range.end)?);
    if span.start > span.end {
        return Err(EditError::OutOfBounds(range.end));
    }

    let mut builder = Builder::new(doc.len());
    builder.replace(span.as_range(), Rope::from(text));

    Ok(Compiled {
        delta: builder.build(),
        changed: Range::new(range.start, end_after_insert(range.start, text)),
    })
}

/// Where the cursor lands after typing `text` at `start`.
fn end_after_insert(start: Position, text: &str) -> Position {
    match text.rfind('\n') {
        Some(last_newline) => Position::new(
            start.row + text.matches('\n').count(),
            text[last_newline + 1..].chars().count(),
        ),
        None => Position::new(start.row, start.column + text.chars().count()),
    }
}
