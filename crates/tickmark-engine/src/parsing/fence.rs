//! Fenced code detection. Fences are raw zones: nothing inside them opens a
//! list item or gets its checkboxes converted.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";
    pub const TILDES: &'static str = "~~~";

    /// Fence signature of a line, ignoring its indentation.
    pub fn sig(line: &str) -> Option<FenceKind> {
        let t = line.trim_start().trim_end_matches(['\r', '\n']);
        if t.starts_with(Self::BACKTICKS) {
            Some(FenceKind::Backticks)
        } else if t.starts_with(Self::TILDES) {
            Some(FenceKind::Tildes)
        } else {
            None
        }
    }

    pub fn closes(open: FenceKind, sig: Option<FenceKind>) -> bool {
        sig == Some(open)
    }
}

/// Tracks whether a running line scan is inside a fenced block.
#[derive(Debug, Default, Clone, Copy)]
pub struct FenceTracker {
    open: Option<FenceKind>,
}

impl FenceTracker {
    /// Feeds one line; returns true if the line is part of a fence, including
    /// the opening and closing delimiter lines.
    pub fn feed(&mut self, line: &str) -> bool {
        let sig = CodeFence::sig(line);
        match self.open {
            Some(kind) => {
                if CodeFence::closes(kind, sig) {
                    self.open = None;
                }
                true
            }
            None => {
                self.open = sig;
                sig.is_some()
            }
        }
    }
}
