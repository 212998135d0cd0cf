//! # List Parsing
//!
//! Discovery and the linter only need list items with their marker and
//! content columns, so this module exposes exactly that: the [`SyntaxTree`]
//! capability plus one implementation of it.
//!
//! ## Modules
//!
//! - **`tree`**: `ListItemNode`, `NodeId`, and the `SyntaxTree` trait
//! - **`outline`**: `OutlineTree`, the bundled indentation-tolerant list parser
//! - **`fence`**: fenced code detection (raw zones)
//! - **`rope`**: byte spans and line iteration over the xi-rope buffer

pub mod fence;
pub mod outline;
pub mod rope;
pub mod tree;

pub use outline::{OutlineTree, parse_list_marker};
pub use tree::{ListItemNode, ListMarker, NodeId, SyntaxTree};
