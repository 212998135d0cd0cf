use std::collections::BTreeMap;

use crate::config::TodoConfig;
use crate::parsing::{ListItemNode, SyntaxTree};
use crate::position::{Position, Range, char_len, char_to_byte};

use super::metadata::{MetadataSet, extract_metadata};
use super::{MarkerForm, MarkerGlyphs, TodoId, TodoItem, TodoMap, TodoMarker, TodoState};

const CHECKBOXES: [(&str, TodoState); 3] = [
    ("[ ]", TodoState::Unchecked),
    ("[x]", TodoState::Checked),
    ("[X]", TodoState::Checked),
];

/// A marker token must be followed by whitespace or the end of the line.
fn ends_token(rest: &str) -> bool {
    rest.chars().next().is_none_or(char::is_whitespace)
}

/// Reads the state marker at the start of `content`, if there is one.
///
/// Returns the state, the marker spelling, and the marker text.
pub fn parse_todo_marker<'a>(
    content: &'a str,
    glyphs: &MarkerGlyphs,
) -> Option<(TodoState, MarkerForm, &'a str)> {
    let by_glyph = [
        (glyphs.unchecked.as_str(), TodoState::Unchecked),
        (glyphs.checked.as_str(), TodoState::Checked),
    ];
    for (glyph, state) in by_glyph {
        if !glyph.is_empty() && content.starts_with(glyph) && ends_token(&content[glyph.len()..])
        {
            return Some((state, MarkerForm::Glyph, &content[..glyph.len()]));
        }
    }
    for (checkbox, state) in CHECKBOXES {
        if content.starts_with(checkbox) && ends_token(&content[checkbox.len()..]) {
            return Some((state, MarkerForm::Checkbox, &content[..checkbox.len()]));
        }
    }
    None
}

struct Discovery<'a, S> {
    lines: &'a [S],
    config: &'a TodoConfig,
    items: BTreeMap<TodoId, TodoItem>,
}

impl<S: AsRef<str>> Discovery<'_, S> {
    fn line(&self, row: usize) -> &str {
        self.lines.get(row).map(|l| l.as_ref()).unwrap_or("")
    }

    fn visit(&mut self, node: &ListItemNode, parent: Option<TodoId>) {
        let nearest = match self.build_item(node, parent) {
            Some(item) => {
                let id = item.id;
                if let Some(parent) = parent.and_then(|p| self.items.get_mut(&p)) {
                    parent.children.push(id);
                }
                self.items.insert(id, item);
                Some(id)
            }
            None => parent,
        };

        for child in &node.children {
            self.visit(child, nearest);
        }
    }

    fn build_item(&self, node: &ListItemNode, parent: Option<TodoId>) -> Option<TodoItem> {
        let row = node.row();
        let line = self.line(row);
        let content = &line[char_to_byte(line, node.content_column)..];
        let (state, form, glyph) = parse_todo_marker(content, &self.config.markers)?;

        let end_row = node.range.end.row;
        let range = Range::new(
            node.range.start,
            Position::new(end_row, char_len(self.line(end_row))),
        );

        let mut metadata = MetadataSet::default();
        for row in range.rows() {
            metadata.merge(extract_metadata(self.line(row), row, &self.config.metadata));
        }

        Some(TodoItem {
            id: TodoId(node.id),
            range,
            state,
            marker: TodoMarker {
                glyph: glyph.to_string(),
                form,
                position: Position::new(row, node.content_column),
            },
            text: content[glyph.len()..].trim().to_string(),
            metadata,
            parent,
            children: Vec::new(),
        })
    }
}

/// Builds the todo map of a document from its list structure.
///
/// Nesting is taken from `tree` as is. A todo's parent is its nearest todo
/// ancestor, however many plain list items sit in between.
pub fn discover<T, S>(tree: &T, lines: &[S], config: &TodoConfig) -> TodoMap
where
    T: SyntaxTree + ?Sized,
    S: AsRef<str>,
{
    let mut discovery = Discovery {
        lines,
        config,
        items: BTreeMap::new(),
    };
    for node in tree.list_items() {
        discovery.visit(node, None);
    }

    log::debug!(
        "discovered {} todos in {} lines",
        discovery.items.len(),
        lines.len()
    );
    TodoMap::from_items(discovery.items)
}
