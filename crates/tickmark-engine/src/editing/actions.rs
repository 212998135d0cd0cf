//! High level todo edits.
//!
//! Every action checks its target against the [`TodoMap`] before touching the
//! document and then applies its edits through one transaction. The map is the
//! one discovered from the current text; after an action it is stale and must
//! be rediscovered.

use crate::config::TodoConfig;
use crate::editing::{Cmd, Document};
use crate::error::EditError;
use crate::lint::LintIssue;
use crate::parsing::parse_list_marker;
use crate::position::{Position, Range, char_len, char_to_byte};
use crate::todo::discovery::parse_todo_marker;
use crate::todo::{
    ChangeSet, MetadataEntry, MetadataObservers, TodoId, TodoItem, TodoMap, TodoState,
    extract_metadata, propagate,
};

fn target(map: &TodoMap, id: TodoId) -> Result<&TodoItem, EditError> {
    map.get(id).ok_or(EditError::InvalidTarget(id))
}

/// Text of `row` from `column` on, or an error if the document no longer
/// starts `expected` there.
fn expect_text(doc: &Document, at: Position, expected: &str) -> Result<String, EditError> {
    let line = doc.line(at.row).ok_or(EditError::OutOfBounds(at))?;
    if at.column > char_len(&line) {
        return Err(EditError::OutOfBounds(at));
    }
    let rest = &line[char_to_byte(&line, at.column)..];
    if !rest.starts_with(expected) {
        return Err(EditError::Rejected(format!(
            "expected '{expected}' at {at}; the document changed since discovery"
        )));
    }
    Ok(rest.to_string())
}

/// Sets the state of `id`, cascading per the smart toggle policy. Returns the
/// applied changes; empty when the item already had that state.
///
/// Every marker in the cascade is checked against the current text first, so
/// a stale map is rejected before anything is written.
pub fn set_todo_state(
    doc: &mut Document,
    map: &TodoMap,
    config: &TodoConfig,
    id: TodoId,
    state: TodoState,
) -> Result<ChangeSet, EditError> {
    let anchor = target(map, id)?.range;
    let changes = propagate(map, &config.smart_toggle, id, state)?;

    let mut edits = Vec::with_capacity(changes.len());
    for change in &changes {
        let marker = &target(map, change.id)?.marker;
        expect_text(doc, marker.position, &marker.glyph)?;
        edits.push(Cmd::ReplaceMarker {
            at: marker.position,
            old: marker.glyph.clone(),
            new: marker.form.render(change.to, &config.markers).to_string(),
        });
    }

    doc.run(
        anchor,
        |tx| {
            for cmd in edits {
                tx.apply(cmd);
            }
        },
        |_| {},
    )?;
    Ok(changes)
}

pub fn toggle_todo(
    doc: &mut Document,
    map: &TodoMap,
    config: &TodoConfig,
    id: TodoId,
) -> Result<ChangeSet, EditError> {
    let state = target(map, id)?.state.toggled();
    set_todo_state(doc, map, config, id, state)
}

/// Turns `row` into an unchecked todo.
///
/// A list item gains the unchecked glyph after its marker; any other line
/// becomes `- <glyph> text` at its current indentation. Returns `false` when
/// the row already holds a todo.
pub fn create_todo(doc: &mut Document, row: usize, config: &TodoConfig) -> Result<bool, EditError> {
    let line = doc.line(row).ok_or(EditError::RowOutOfBounds(row))?;
    let glyph = &config.markers.unchecked;
    let len = char_len(&line);

    let cmd = match parse_list_marker(&line) {
        Some(list) if list.content_column > len => Cmd::InsertText {
            at: Position::new(row, len),
            text: format!(" {glyph} "),
        },
        Some(list) => {
            let content = &line[char_to_byte(&line, list.content_column)..];
            if parse_todo_marker(content, &config.markers).is_some() {
                return Ok(false);
            }
            Cmd::InsertText {
                at: Position::new(row, list.content_column),
                text: format!("{glyph} "),
            }
        }
        None => {
            let text = line.trim_start();
            let indent = &line[..line.len() - text.len()];
            Cmd::SetText {
                range: Range::on_row(row, 0, len),
                lines: vec![format!("{indent}- {glyph} {text}")],
            }
        }
    };

    doc.run(Range::on_row(row, 0, len), |tx| tx.apply(cmd), |_| {})?;
    Ok(true)
}

/// Deletes the marker of `id` and the whitespace character after it, leaving
/// a plain list item.
pub fn remove_todo_marker(doc: &mut Document, map: &TodoMap, id: TodoId) -> Result<(), EditError> {
    let item = target(map, id)?;
    let marker = &item.marker;
    let rest = expect_text(doc, marker.position, &marker.glyph)?;

    let mut range = marker.range();
    if rest[marker.glyph.len()..].starts_with([' ', '\t']) {
        range.end.column += 1;
    }

    doc.run(
        item.range,
        |tx| tx.apply(Cmd::DeleteRange { range }),
        |_| {},
    )?;
    Ok(())
}

/// Value text that can sit inside `@tag(...)` without ending it early.
fn check_value(value: &str) -> Result<(), EditError> {
    let mut depth = 0i32;
    for c in value.chars() {
        match c {
            '\n' | '\r' => {
                return Err(EditError::Rejected("metadata values are single-line".into()));
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        return Err(EditError::Rejected(format!(
            "unbalanced parentheses in metadata value '{value}'"
        )));
    }
    Ok(())
}

/// Entries for `tag` on lines of `item` that no child todo covers. A child's
/// tags show up in its parent's metadata but are edited through the child.
fn own_entries<'a>(
    map: &'a TodoMap,
    item: &'a TodoItem,
    tag: &'a str,
    config: &'a TodoConfig,
) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
    item.metadata
        .matching(tag, &config.metadata)
        .filter(move |entry| {
            let row = entry.range.start.row;
            !map.children(item.id).any(|child| child.range.rows().contains(&row))
        })
}

/// Adds `@tag(value)` to the first line of `id`, or replaces the value of the
/// last occurrence of the tag (aliases included). Observers hear about the
/// new entry once it is in the document.
pub fn add_metadata(
    doc: &mut Document,
    map: &TodoMap,
    config: &TodoConfig,
    id: TodoId,
    tag: &str,
    value: &str,
    observers: &MetadataObservers,
) -> Result<MetadataEntry, EditError> {
    let item = target(map, id)?;
    check_value(value)?;

    let existing = own_entries(map, item, tag, config).last();
    let (row, cmd) = match existing {
        Some(entry) => {
            expect_text(doc, entry.range.start, &format!("@{}(", entry.tag))?;
            let cmd = Cmd::SetText {
                range: entry.range,
                lines: vec![format!("@{}({value})", entry.tag)],
            };
            (entry.range.start.row, cmd)
        }
        None => {
            let row = item.row();
            let line = doc.line(row).ok_or(EditError::RowOutOfBounds(row))?;
            let cmd = Cmd::InsertText {
                at: Position::new(row, char_len(&line)),
                text: format!(" @{tag}({value})"),
            };
            (row, cmd)
        }
    };

    let column = match &cmd {
        Cmd::SetText { range, .. } => range.start.column,
        Cmd::InsertText { at, .. } => at.column + 1,
        _ => 0,
    };
    doc.run(item.range, |tx| tx.apply(cmd), |_| {})?;

    let line = doc.line(row).unwrap_or_default();
    let entry = extract_metadata(&line, row, &config.metadata)
        .entries
        .into_iter()
        .find(|e| e.position_in_line == column)
        .ok_or_else(|| EditError::Rejected(format!("could not read back @{tag} on row {row}")))?;
    observers.notify_add(item, &entry);
    Ok(entry)
}

/// Removes every occurrence of `tag` (or an alias of it) on lines of `id` that
/// no child todo covers, together with the space before each. Returns the
/// removed entries in document order.
pub fn remove_metadata(
    doc: &mut Document,
    map: &TodoMap,
    config: &TodoConfig,
    id: TodoId,
    tag: &str,
    observers: &MetadataObservers,
) -> Result<Vec<MetadataEntry>, EditError> {
    let item = target(map, id)?;
    let removed: Vec<MetadataEntry> = own_entries(map, item, tag, config).cloned().collect();
    if removed.is_empty() {
        return Ok(removed);
    }

    let mut deletions = Vec::with_capacity(removed.len());
    for entry in &removed {
        expect_text(doc, entry.range.start, &format!("@{}(", entry.tag))?;
        let mut range = entry.range;
        let line = doc.line(range.start.row).unwrap_or_default();
        let before = line.chars().nth(range.start.column.wrapping_sub(1));
        if matches!(before, Some(' ' | '\t')) {
            range.start.column -= 1;
        }
        deletions.push(range);
    }
    // Right to left so earlier ranges stay valid.
    deletions.sort_by(|a, b| b.start.cmp(&a.start));

    doc.run(
        item.range,
        |tx| {
            for range in deletions {
                tx.apply(Cmd::DeleteRange { range });
            }
        },
        |_| {},
    )?;

    for entry in &removed {
        observers.notify_remove(item, entry);
    }
    Ok(removed)
}

/// Applies the fixes carried by `issues` in one transaction, bottom-up.
/// Returns how many were applied.
pub fn apply_fixes(doc: &mut Document, issues: &[LintIssue]) -> Result<usize, EditError> {
    let mut fixes: Vec<_> = issues.iter().filter_map(|i| i.fix.clone()).collect();
    fixes.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    fixes.dedup_by(|a, b| a.range.overlaps(&b.range));
    if fixes.is_empty() {
        return Ok(0);
    }

    let count = fixes.len();
    let anchor = Range::new(fixes[count - 1].range.start, fixes[0].range.end);
    doc.run(
        anchor,
        |tx| {
            for fix in fixes {
                tx.set_text(fix.range, vec![fix.replacement]);
            }
        },
        |_| {},
    )?;
    log::debug!("applied {count} lint fixes");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::todo::MetadataObserver;
    use pretty_assertions::assert_eq;

    fn setup(text: &str) -> (Document, TodoMap, TodoConfig) {
        let config = TodoConfig::default();
        let doc = Document::from_text(text);
        let map = doc.discover(&config);
        (doc, map, config)
    }

    fn id_on(map: &TodoMap, row: usize) -> TodoId {
        map.item_on_row(row).unwrap().id
    }

    #[test]
    fn checking_a_parent_checks_its_children() {
        let (mut doc, map, config) = setup("- □ Parent\n  - □ a\n  - □ b\n  - □ c\n");
        let changes =
            set_todo_state(&mut doc, &map, &config, id_on(&map, 0), TodoState::Checked).unwrap();
        assert_eq!(changes.len(), 4);
        assert_eq!(doc.text(), "- ✔ Parent\n  - ✔ a\n  - ✔ b\n  - ✔ c\n");
    }

    #[test]
    fn checkbox_form_is_kept() {
        let (mut doc, map, config) = setup("- [ ] a\n- □ b\n");
        toggle_todo(&mut doc, &map, &config, id_on(&map, 0)).unwrap();
        toggle_todo(&mut doc, &map, &config, id_on(&map, 1)).unwrap();
        assert_eq!(doc.text(), "- [x] a\n- ✔ b\n");
    }

    #[test]
    fn setting_the_current_state_changes_nothing() {
        let (mut doc, map, config) = setup("- ✔ done\n");
        let changes =
            set_todo_state(&mut doc, &map, &config, id_on(&map, 0), TodoState::Checked).unwrap();
        assert!(changes.is_empty());
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn unknown_id_mutates_nothing() {
        let (mut doc, map, config) = setup("- □ a\n");
        let ghost = TodoId(crate::parsing::NodeId { row: 7, column: 0 });
        let err = toggle_todo(&mut doc, &map, &config, ghost).unwrap_err();
        assert_eq!(err, EditError::InvalidTarget(ghost));
        assert_eq!(doc.text(), "- □ a\n");
        assert!(!doc.is_transaction_active());
    }

    #[test]
    fn stale_map_is_rejected() {
        let (mut doc, map, config) = setup("- □ a\n");
        doc.set_text(Range::on_row(0, 2, 3), vec!["✔".to_string()])
            .unwrap();
        let err = toggle_todo(&mut doc, &map, &config, id_on(&map, 0)).unwrap_err();
        assert!(matches!(err, EditError::Rejected(_)));
        assert_eq!(doc.text(), "- ✔ a\n");
    }

    #[test]
    fn stale_child_marker_leaves_the_parent_alone() {
        let (mut doc, map, config) = setup("- □ p\n  - □ c\n");
        doc.set_text(Range::on_row(1, 4, 5), vec!["x".to_string()])
            .unwrap();
        let version = doc.version();

        let err = set_todo_state(&mut doc, &map, &config, id_on(&map, 0), TodoState::Checked)
            .unwrap_err();

        assert!(matches!(err, EditError::Rejected(_)));
        assert_eq!(doc.text(), "- □ p\n  - x c\n");
        assert_eq!(doc.version(), version);
    }

    #[test]
    fn create_todo_variants() {
        let config = TodoConfig::default();
        let mut doc = Document::from_text("- item\n  plain text\n- □ already\n-\n");
        assert!(create_todo(&mut doc, 0, &config).unwrap());
        assert!(create_todo(&mut doc, 1, &config).unwrap());
        assert!(!create_todo(&mut doc, 2, &config).unwrap());
        assert!(create_todo(&mut doc, 3, &config).unwrap());
        assert_eq!(
            doc.text(),
            "- □ item\n  - □ plain text\n- □ already\n- □ \n"
        );
        assert_eq!(
            create_todo(&mut doc, 9, &config).unwrap_err(),
            EditError::RowOutOfBounds(9)
        );
    }

    #[test]
    fn remove_marker_leaves_plain_item() {
        let (mut doc, map, _) = setup("- [x] done\n  - □ open\n");
        remove_todo_marker(&mut doc, &map, id_on(&map, 0)).unwrap();
        remove_todo_marker(&mut doc, &map, id_on(&map, 1)).unwrap();
        assert_eq!(doc.text(), "- done\n  - open\n");
    }

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl MetadataObserver for Recorder {
        fn on_add(&self, item: &TodoItem, entry: &MetadataEntry) {
            self.0
                .borrow_mut()
                .push(format!("+{}={} on {}", entry.tag, entry.value, item.text));
        }

        fn on_remove(&self, _item: &TodoItem, entry: &MetadataEntry) {
            self.0.borrow_mut().push(format!("-{}", entry.tag));
        }
    }

    #[test]
    fn add_metadata_appends_then_replaces() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = MetadataObservers::new();
        observers.register(Recorder(seen.clone()));

        let (mut doc, map, config) = setup("- □ Task\n");
        let entry = add_metadata(&mut doc, &map, &config, id_on(&map, 0), "due", "today", &observers)
            .unwrap();
        assert_eq!(doc.text(), "- □ Task @due(today)\n");
        assert_eq!(entry.range, Range::on_row(0, 9, 20));

        let map = doc.discover(&config);
        add_metadata(&mut doc, &map, &config, id_on(&map, 0), "due", "tomorrow", &observers)
            .unwrap();
        assert_eq!(doc.text(), "- □ Task @due(tomorrow)\n");
        assert_eq!(
            *seen.borrow(),
            vec!["+due=today on Task", "+due=tomorrow on Task @due(today)"]
        );
    }

    #[test]
    fn add_metadata_rejects_unbalanced_values() {
        let (mut doc, map, config) = setup("- □ Task\n");
        let err = add_metadata(
            &mut doc,
            &map,
            &config,
            id_on(&map, 0),
            "due",
            "soon)",
            &MetadataObservers::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EditError::Rejected(_)));
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn remove_metadata_handles_aliases() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers = MetadataObservers::new();
        observers.register(Recorder(seen.clone()));

        let (mut doc, map, config) = setup("- □ Task @p(high) @due(x) @priority(low)\n");
        let removed =
            remove_metadata(&mut doc, &map, &config, id_on(&map, 0), "priority", &observers)
                .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(doc.text(), "- □ Task @due(x)\n");
        assert_eq!(*seen.borrow(), vec!["-p", "-priority"]);
    }

    #[test]
    fn tag_edits_skip_lines_of_child_todos() {
        let (mut doc, map, config) = setup("- □ Parent\n  - □ child @due(mon)\n");
        let parent = id_on(&map, 0);
        assert_eq!(map.get(parent).unwrap().metadata.value("due"), Some("mon"));

        let removed =
            remove_metadata(&mut doc, &map, &config, parent, "due", &MetadataObservers::new())
                .unwrap();
        assert!(removed.is_empty());

        add_metadata(&mut doc, &map, &config, parent, "due", "fri", &MetadataObservers::new())
            .unwrap();
        assert_eq!(doc.text(), "- □ Parent @due(fri)\n  - □ child @due(mon)\n");
    }

    #[test]
    fn lint_fixes_apply_bottom_up() {
        let config = TodoConfig::default();
        let mut doc = Document::from_text("- a\n - b\n- c\n         - d\n");
        let issues = doc.lint(&config);
        assert_eq!(issues.len(), 2);
        assert_eq!(apply_fixes(&mut doc, &issues).unwrap(), 2);
        assert_eq!(doc.text(), "- a\n  - b\n- c\n  - d\n");
        assert!(doc.lint(&config).is_empty());
    }
}
