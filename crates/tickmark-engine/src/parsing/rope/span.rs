/// A byte range `[start, end)` into the rope.
///
/// Edit commands resolve character positions to spans before building a
/// delta, so the rope only ever sees byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// An empty span is an insertion point.
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn as_range(self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}
