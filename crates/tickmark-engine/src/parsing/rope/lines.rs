use xi_rope::Rope;

use super::span::Span;

/// A reference to a single line in the rope with its byte span.
#[derive(Debug, Clone)]
pub struct LineRef {
    /// Byte span of this line in the rope (includes newline if present).
    pub span: Span,
    /// The line text with its line terminator stripped.
    pub text: String,
}

impl LineRef {
    /// Byte span of the line content, excluding `\n` / `\r\n`.
    pub fn content_span(&self) -> Span {
        Span::new(self.span.start, self.span.start + self.text.len())
    }
}

/// Returns an iterator over lines with their byte spans.
///
/// Uses `lines_raw` so spans account for newline characters; the stored text
/// has them trimmed.
pub fn lines_with_spans(rope: &Rope) -> impl Iterator<Item = LineRef> + '_ {
    let mut offset = 0usize;
    rope.lines_raw(..).map(move |line| {
        let start = offset;
        let len = line.len();
        offset += len;
        LineRef {
            span: Span::new(start, offset),
            text: line.trim_end_matches(['\r', '\n']).to_string(),
        }
    })
}
