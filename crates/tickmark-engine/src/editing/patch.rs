use crate::position::Range;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Where the inserted text now sits, in post-edit coordinates. Empty for
    /// pure deletions.
    pub changed: Range,
    pub version: u64,
}
