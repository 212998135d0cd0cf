use std::fmt;

use serde::Serialize;

use crate::position::{Position, Range};

/// Structural identity of a list item: the row it starts on and the column of
/// its marker. Identical text always yields identical ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId {
    pub row: usize,
    pub column: usize,
}

impl From<Position> for NodeId {
    fn from(p: Position) -> Self {
        Self {
            row: p.row,
            column: p.column,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// The bullet or number that opens a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ListMarker {
    /// `-`, `*` or `+`
    Bullet(char),
    /// `1.`, `2)` ...
    Ordered { number: u32, delimiter: char },
}

impl ListMarker {
    pub fn is_ordered(&self) -> bool {
        matches!(self, ListMarker::Ordered { .. })
    }

    /// Width of the marker text in characters.
    pub fn width(&self) -> usize {
        match self {
            ListMarker::Bullet(_) => 1,
            ListMarker::Ordered { number, .. } => number.to_string().len() + 1,
        }
    }
}

impl fmt::Display for ListMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListMarker::Bullet(c) => write!(f, "{c}"),
            ListMarker::Ordered { number, delimiter } => write!(f, "{number}{delimiter}"),
        }
    }
}

/// One list item of the syntax tree, in character coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItemNode {
    pub id: NodeId,
    pub marker: ListMarker,
    /// Where the list marker begins.
    pub marker_position: Position,
    /// Column of the first non-whitespace character after the marker.
    pub content_column: usize,
    /// From the marker to the end of the item's last line, nested items
    /// included.
    pub range: Range,
    /// Direct children in document order.
    pub children: Vec<ListItemNode>,
}

impl ListItemNode {
    pub fn row(&self) -> usize {
        self.marker_position.row
    }

    pub fn marker_column(&self) -> usize {
        self.marker_position.column
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &ListItemNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// The list structure a parser hands to discovery and the linter.
///
/// Any parser can feed the engine as long as it produces [`ListItemNode`]s in
/// character coordinates.
pub trait SyntaxTree {
    /// Top-level list items in document order.
    fn list_items(&self) -> &[ListItemNode];

    /// Every list item, pre-order (ascending start row).
    fn all_items(&self) -> Vec<&ListItemNode> {
        self.list_items().iter().flat_map(ListItemNode::walk).collect()
    }
}

impl SyntaxTree for [ListItemNode] {
    fn list_items(&self) -> &[ListItemNode] {
        self
    }
}

impl SyntaxTree for Vec<ListItemNode> {
    fn list_items(&self) -> &[ListItemNode] {
        self
    }
}
