use std::fmt;

use xi_rope::Rope;

use crate::config::TodoConfig;
use crate::editing::commands::{Compiled, compile_command};
use crate::editing::{Cmd, Patch, Transaction};
use crate::error::EditError;
use crate::lint::{LintIssue, Linter};
use crate::parsing::OutlineTree;
use crate::parsing::rope::{LineRef, lines_with_spans, preview};
use crate::position::{Position, Range, char_len, char_to_byte};
use crate::todo::{TodoMap, discover};

/// A markdown buffer the engine edits.
///
/// The rope is the single source of truth: nothing is regenerated from the
/// todo model, so `text()` returns exactly what was loaded plus the applied
/// edits. All addressing is by character [`Position`]; byte offsets stay
/// internal.
pub struct Document {
    pub(crate) buffer: Rope,
    /// Incremented on each successful edit
    pub(crate) version: u64,
    /// The one transaction that may be running against this document.
    pub(crate) transaction: Option<Transaction>,
}

impl Document {
    /// Create a new document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            buffer: Rope::from(text),
            version: 0,
            transaction: None,
        }
    }

    /// Get the document's content as raw bytes (exact round-trip)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Number of lines; a trailing newline does not start another line.
    pub fn line_count(&self) -> usize {
        lines_with_spans(&self.buffer).count()
    }

    pub fn lines(&self) -> Vec<String> {
        lines_with_spans(&self.buffer).map(|l| l.text).collect()
    }

    pub fn line(&self, row: usize) -> Option<String> {
        self.line_ref(row).map(|l| l.text)
    }

    /// Lines `rows.start..rows.end`, clamped to the document.
    pub fn get_lines(&self, rows: std::ops::Range<usize>) -> Vec<String> {
        lines_with_spans(&self.buffer)
            .skip(rows.start)
            .take(rows.end.saturating_sub(rows.start))
            .map(|l| l.text)
            .collect()
    }

    fn line_ref(&self, row: usize) -> Option<LineRef> {
        lines_with_spans(&self.buffer).nth(row)
    }

    fn ends_with_newline(&self) -> bool {
        self.buffer
            .lines_raw(..)
            .last()
            .is_none_or(|line| line.ends_with('\n'))
    }

    /// Byte offset of `pos`. A column may sit one past the last character;
    /// the row after the last line is addressable at column 0 when the text
    /// ends in a newline.
    pub(crate) fn offset_of(&self, pos: Position) -> Result<usize, EditError> {
        match self.line_ref(pos.row) {
            Some(line) if pos.column <= char_len(&line.text) => {
                Ok(line.span.start + char_to_byte(&line.text, pos.column))
            }
            None if pos.column == 0
                && pos.row == self.line_count()
                && self.ends_with_newline() =>
            {
                Ok(self.len())
            }
            _ => Err(EditError::OutOfBounds(pos)),
        }
    }

    /// Replaces the character range with `new_lines` joined by `\n`.
    pub fn set_text(&mut self, range: Range, new_lines: Vec<String>) -> Result<Patch, EditError> {
        self.apply(Cmd::SetText {
            range,
            lines: new_lines,
        })
    }

    /// Apply command to document. A failed command leaves the buffer and the
    /// version untouched.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let Compiled { delta, changed } = compile_command(self, &cmd)?;
        self.buffer = delta.apply(&self.buffer);
        self.version += 1;

        if log::log_enabled!(log::Level::Trace) {
            let row_span = self
                .line_ref(changed.start.row)
                .map(|l| l.content_span())
                .unwrap_or_default();
            log::trace!(
                "v{} changed {changed}: {:?}",
                self.version,
                preview(&self.buffer, row_span, 40)
            );
        }

        Ok(Patch {
            changed,
            version: self.version,
        })
    }

    pub fn outline(&self) -> OutlineTree {
        OutlineTree::parse(&self.lines())
    }

    /// Parses the buffer and builds its todo map in one go.
    pub fn discover(&self, config: &TodoConfig) -> TodoMap {
        discover(&self.outline(), &self.lines(), config)
    }

    pub fn lint(&self, config: &TodoConfig) -> Vec<LintIssue> {
        let lines = self.lines();
        Linter::new(config.linter.clone()).lint(&OutlineTree::parse(&lines), &lines)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.len())
            .field("version", &self.version)
            .field("transaction_active", &self.transaction.is_some())
            .finish()
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}
