//! # Todo model
//!
//! A todo is a list item whose first content token is a state marker: one of
//! the configured glyphs, or a `[ ]` / `[x]` checkbox. Discovery turns a
//! syntax tree into a [`TodoMap`]; the map is rebuilt from scratch after every
//! edit and never patched in place.

pub mod discovery;
pub mod format;
pub mod metadata;
pub mod toggle;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parsing::NodeId;
use crate::position::{Position, Range};

pub use discovery::discover;
pub use format::{to_glyphs, to_markdown};
pub use metadata::{
    MetadataEntry, MetadataObserver, MetadataObservers, MetadataSchema, MetadataSet,
    TagDefinition, extract_metadata,
};
pub use toggle::{ChangeSet, Propagation, SmartToggleConfig, StateChange, propagate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoState {
    Unchecked,
    Checked,
}

impl TodoState {
    pub fn toggled(self) -> Self {
        match self {
            TodoState::Unchecked => TodoState::Checked,
            TodoState::Checked => TodoState::Unchecked,
        }
    }
}

impl fmt::Display for TodoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoState::Unchecked => write!(f, "unchecked"),
            TodoState::Checked => write!(f, "checked"),
        }
    }
}

/// Identity of a todo within one discovery pass, derived from the list item
/// it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TodoId(pub NodeId);

impl TodoId {
    pub fn row(&self) -> usize {
        self.0.row
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The two glyphs shown in place of markdown checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerGlyphs {
    pub unchecked: String,
    pub checked: String,
}

impl Default for MarkerGlyphs {
    fn default() -> Self {
        Self {
            unchecked: "□".to_string(),
            checked: "✔".to_string(),
        }
    }
}

impl MarkerGlyphs {
    pub fn for_state(&self, state: TodoState) -> &str {
        match state {
            TodoState::Unchecked => &self.unchecked,
            TodoState::Checked => &self.checked,
        }
    }
}

/// How a marker is spelled in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarkerForm {
    /// One of the configured glyphs.
    Glyph,
    /// A markdown checkbox: `[ ]`, `[x]` or `[X]`.
    Checkbox,
}

impl MarkerForm {
    /// Marker text for `state` in this form.
    pub fn render(self, state: TodoState, glyphs: &MarkerGlyphs) -> &str {
        match (self, state) {
            (MarkerForm::Glyph, state) => glyphs.for_state(state),
            (MarkerForm::Checkbox, TodoState::Unchecked) => "[ ]",
            (MarkerForm::Checkbox, TodoState::Checked) => "[x]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoMarker {
    /// The marker text exactly as found.
    pub glyph: String,
    pub form: MarkerForm,
    pub position: Position,
}

impl TodoMarker {
    /// Range of the marker text on its row.
    pub fn range(&self) -> Range {
        let width = self.glyph.chars().count();
        Range::on_row(
            self.position.row,
            self.position.column,
            self.position.column + width,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoItem {
    pub id: TodoId,
    pub range: Range,
    pub state: TodoState,
    pub marker: TodoMarker,
    /// First-line text after the marker, trimmed.
    pub text: String,
    pub metadata: MetadataSet,
    pub parent: Option<TodoId>,
    /// Sorted by `range.start`.
    pub children: Vec<TodoId>,
}

impl TodoItem {
    pub fn is_checked(&self) -> bool {
        self.state == TodoState::Checked
    }

    pub fn row(&self) -> usize {
        self.range.start.row
    }

    /// Completion over all descendant todos, the "2/5" counter.
    pub fn progress(&self, map: &TodoMap) -> Progress {
        let mut progress = Progress::default();
        for item in map.descendants(self.id) {
            progress.total += 1;
            if item.is_checked() {
                progress.completed += 1;
            }
        }
        progress
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.completed, self.total)
    }
}

/// Every todo of a document, keyed (and therefore ordered) by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoMap {
    items: BTreeMap<TodoId, TodoItem>,
}

impl TodoMap {
    pub(crate) fn from_items(items: BTreeMap<TodoId, TodoItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: TodoId) -> bool {
        self.items.contains_key(&id)
    }

    /// Items in document order.
    pub fn iter(&self) -> impl Iterator<Item = &TodoItem> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TodoId> + '_ {
        self.items.keys().copied()
    }

    /// Items without a todo parent.
    pub fn roots(&self) -> impl Iterator<Item = &TodoItem> {
        self.items.values().filter(|i| i.parent.is_none())
    }

    pub fn children(&self, id: TodoId) -> impl Iterator<Item = &TodoItem> {
        self.get(id)
            .into_iter()
            .flat_map(|item| item.children.iter())
            .filter_map(|child| self.get(*child))
    }

    /// All todos below `id`, pre-order.
    pub fn descendants(&self, id: TodoId) -> Vec<&TodoItem> {
        let mut out = Vec::new();
        let mut stack: Vec<TodoId> = self
            .get(id)
            .map(|i| i.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(item) = self.get(next) {
                out.push(item);
                stack.extend(item.children.iter().rev().copied());
            }
        }
        out
    }

    /// The innermost todo whose range covers `row`.
    pub fn item_at_row(&self, row: usize) -> Option<&TodoItem> {
        self.items
            .values()
            .filter(|i| i.range.rows().contains(&row))
            .max_by_key(|i| i.range.start)
    }

    /// The todo whose marker sits on `row`.
    pub fn item_on_row(&self, row: usize) -> Option<&TodoItem> {
        self.items.values().find(|i| i.row() == row)
    }
}

impl<'a> IntoIterator for &'a TodoMap {
    type Item = &'a TodoItem;
    type IntoIter = std::collections::btree_map::Values<'a, TodoId, TodoItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}
