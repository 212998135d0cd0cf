//! Todo lists inside markdown: discovery, smart toggling, metadata tags,
//! indentation linting and transactional editing.
//!
//! ```rust
//! use tickmark_engine::{Document, TodoConfig, TodoState, set_todo_state};
//!
//! let config = TodoConfig::default();
//! let mut doc = Document::from_text("- □ Ship it\n  - □ Tests\n  - □ Docs\n");
//! let map = doc.discover(&config);
//! let parent = map.item_on_row(0).unwrap().id;
//!
//! let changes = set_todo_state(&mut doc, &map, &config, parent, TodoState::Checked).unwrap();
//! assert_eq!(changes.len(), 3);
//! assert_eq!(doc.text(), "- ✔ Ship it\n  - ✔ Tests\n  - ✔ Docs\n");
//! ```

pub mod config;
pub mod editing;
pub mod error;
pub mod lint;
pub mod parsing;
pub mod position;
pub mod todo;

// Re-export key types for easier usage
pub use config::TodoConfig;
pub use editing::*;
pub use error::{EditError, TransactionError};
pub use lint::{DiagnosticsSink, LintIssue, Linter, LinterConfig, Severity};
pub use parsing::{ListItemNode, OutlineTree, SyntaxTree};
pub use position::{Position, Range};
pub use todo::{TodoId, TodoItem, TodoMap, TodoState, discover, to_glyphs, to_markdown};
