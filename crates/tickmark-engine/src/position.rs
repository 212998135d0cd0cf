//! Row/column coordinates used throughout the engine.
//!
//! Columns are counted in characters (Unicode scalar values). Hosts that
//! address text by byte offsets convert through [`BytePosition`], which is
//! always derived from the text of the line it points into.

use std::fmt;

use serde::Serialize;

/// A character-indexed point in a document. Both fields are 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Converts this position into a byte offset within `line`.
    ///
    /// A column past the end of the line is clamped to the line length.
    pub fn to_byte(self, line: &str) -> BytePosition {
        BytePosition {
            row: self.row,
            byte: char_to_byte(line, self.column),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// A byte-indexed point, for hosts that address lines by UTF-8 offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BytePosition {
    pub row: usize,
    pub byte: usize,
}

impl BytePosition {
    pub const fn new(row: usize, byte: usize) -> Self {
        Self { row, byte }
    }

    /// Converts back into character units. A byte offset that falls inside a
    /// multi-byte character resolves to that character's column.
    pub fn to_char(self, line: &str) -> Position {
        Position {
            row: self.row,
            column: byte_to_char(line, self.byte),
        }
    }
}

/// Byte offset of the `column`th character of `line`.
pub fn char_to_byte(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len())
}

/// Character column of the byte offset `byte` in `line`.
pub fn byte_to_char(line: &str, byte: usize) -> usize {
    line.char_indices()
        .take_while(|(idx, c)| idx + c.len_utf8() <= byte)
        .count()
}

/// Length of `line` in characters.
pub fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// A half-open range between two positions.
///
/// `end` points one past the last included character on its row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Builds a range, swapping the endpoints if they arrive reversed so that
    /// `start <= end` always holds.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// A range covering `start..end` columns of a single row.
    pub fn on_row(row: usize, start: usize, end: usize) -> Self {
        Self::new(Position::new(row, start), Position::new(row, end))
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `pos` lies inside the range. The end position counts as inside
    /// so that a cursor sitting just after the last character still resolves.
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the ranges share at least one position.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Rows touched by this range, inclusive of the end row.
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start.row..=self.end.row
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("- [ ] task", 4, 4)]
    #[case("- □ task", 3, 5)]
    #[case("- ✔ done", 2, 2)]
    #[case("- ✔ done", 3, 5)]
    #[case("short", 10, 5)]
    fn char_column_maps_to_byte_offset(
        #[case] line: &str,
        #[case] column: usize,
        #[case] byte: usize,
    ) {
        assert_eq!(Position::new(0, column).to_byte(line).byte, byte);
    }

    #[test]
    fn byte_position_round_trips_on_char_boundaries() {
        let line = "- □ Tâche @due(demain)";
        for (byte, _) in line.char_indices() {
            let pos = BytePosition::new(3, byte).to_char(line);
            assert_eq!(pos.to_byte(line), BytePosition::new(3, byte));
        }
    }

    #[test]
    fn byte_inside_multibyte_char_resolves_to_that_char() {
        // "□" occupies bytes 2..5
        assert_eq!(BytePosition::new(0, 3).to_char("- □ x").column, 2);
        assert_eq!(BytePosition::new(0, 4).to_char("- □ x").column, 2);
        assert_eq!(BytePosition::new(0, 5).to_char("- □ x").column, 3);
        assert_eq!(BytePosition::new(0, 99).to_char("- □ x").column, 5);
    }

    #[test]
    fn range_new_normalises_reversed_endpoints() {
        let r = Range::new(Position::new(2, 0), Position::new(1, 4));
        assert_eq!(r.start, Position::new(1, 4));
        assert_eq!(r.end, Position::new(2, 0));
    }

    #[test]
    fn range_containment() {
        let outer = Range::new(Position::new(0, 0), Position::new(3, 10));
        let inner = Range::new(Position::new(1, 2), Position::new(2, 8));
        assert!(outer.contains_range(&inner));
        assert!(!inner.contains_range(&outer));
        assert!(outer.contains(Position::new(3, 10)));
        assert!(!outer.contains(Position::new(3, 11)));
        assert!(outer.overlaps(&inner));
    }

    #[test]
    fn positions_order_by_row_then_column() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(1, 1) < Position::new(1, 2));
    }
}
