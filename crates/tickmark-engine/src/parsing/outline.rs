//! # Outline parsing
//!
//! Two-phase list parsing, the same shape as block parsing:
//!
//! 1. **Line classification**: each line is classified on local facts only
//!    (indentation, list marker, content column, blank, heading, fence).
//! 2. **Tree construction**: an [`OutlineBuilder`] keeps a stack of open list
//!    items and closes/extends them as lines arrive.
//!
//! Nesting is decided by marker columns alone and is deliberately tolerant: an
//! item indented by a single space still nests under the item above it. Whether
//! that indentation is *correct* is for the linter to judge.

use crate::position::{Position, Range, char_len};

use super::fence::FenceTracker;
use super::tree::{ListItemNode, ListMarker, NodeId, SyntaxTree};

/// Local facts about one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClass {
    pub row: usize,
    /// Leading whitespace width in characters.
    pub indent: usize,
    /// Line length in characters.
    pub len: usize,
    pub is_blank: bool,
    pub is_heading: bool,
    /// Part of a fenced code block, delimiters included.
    pub in_fence: bool,
    pub list: Option<ListLine>,
}

/// The list-item part of a classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine {
    pub marker: ListMarker,
    pub marker_column: usize,
    pub content_column: usize,
}

/// Recognises a list marker at the start of `line` (after indentation).
pub fn parse_list_marker(line: &str) -> Option<ListLine> {
    let chars: Vec<char> = line.chars().collect();
    let indent = chars.iter().take_while(|c| **c == ' ' || **c == '\t').count();
    let rest = &chars[indent..];

    let (marker, width) = match rest.first()? {
        c @ ('-' | '*' | '+') => (ListMarker::Bullet(*c), 1),
        c if c.is_ascii_digit() => {
            let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            let delimiter = *rest.get(digits)?;
            if delimiter != '.' && delimiter != ')' {
                return None;
            }
            let number: String = rest[..digits].iter().collect();
            let number = number.parse().ok()?;
            (ListMarker::Ordered { number, delimiter }, digits + 1)
        }
        _ => return None,
    };

    let after = indent + width;
    match chars.get(after) {
        None => Some(ListLine {
            marker,
            marker_column: indent,
            content_column: after + 1,
        }),
        Some(' ' | '\t') => {
            let gap = chars[after..]
                .iter()
                .take_while(|c| **c == ' ' || **c == '\t')
                .count();
            let content_column = if after + gap == chars.len() {
                after + 1
            } else {
                after + gap
            };
            Some(ListLine {
                marker,
                marker_column: indent,
                content_column,
            })
        }
        _ => None,
    }
}

/// `#` to `######` followed by whitespace or the end of the line.
fn is_atx_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

/// Classifies lines for the tree construction phase.
#[derive(Debug, Default)]
pub struct OutlineLineClassifier {
    fence: FenceTracker,
}

impl OutlineLineClassifier {
    pub fn classify(&mut self, row: usize, line: &str) -> LineClass {
        let in_fence = self.fence.feed(line);
        let trimmed = line.trim_start();
        let indent = char_len(line) - char_len(trimmed);
        let is_blank = trimmed.trim_end().is_empty();
        let is_heading = !in_fence && indent < 4 && is_atx_heading(trimmed);
        let list = if in_fence || is_heading {
            None
        } else {
            parse_list_marker(line)
        };

        LineClass {
            row,
            indent,
            len: char_len(line),
            is_blank,
            is_heading,
            in_fence,
            list,
        }
    }
}

#[derive(Debug)]
struct OpenItem {
    node: ListItemNode,
    last_row: usize,
    last_len: usize,
}

impl OpenItem {
    fn close(mut self) -> ListItemNode {
        self.node.range.end = Position::new(self.last_row, self.last_len);
        self.node
    }
}

/// Stack machine turning classified lines into a list item forest.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    stack: Vec<OpenItem>,
    out: Vec<ListItemNode>,
    after_blank: bool,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: &LineClass) {
        if c.is_blank {
            if c.in_fence {
                self.extend_top(c);
            } else {
                self.after_blank = true;
            }
            return;
        }

        if let Some(list) = &c.list {
            self.close_while(|open| open.node.marker_column() >= list.marker_column);
            self.open(c, list);
        } else if c.is_heading {
            self.close_while(|_| true);
        } else if c.indent == 0 {
            if self.after_blank || c.in_fence {
                self.close_while(|_| true);
            } else {
                self.extend_top(c);
            }
        } else {
            self.close_while(|open| open.node.marker_column() >= c.indent);
            self.extend_top(c);
        }

        self.after_blank = false;
    }

    pub fn finish(mut self) -> Vec<ListItemNode> {
        self.close_while(|_| true);
        self.out
    }

    fn open(&mut self, c: &LineClass, list: &ListLine) {
        let start = Position::new(c.row, list.marker_column);
        self.stack.push(OpenItem {
            node: ListItemNode {
                id: NodeId::from(start),
                marker: list.marker.clone(),
                marker_position: start,
                content_column: list.content_column,
                range: Range::new(start, Position::new(c.row, c.len)),
                children: Vec::new(),
            },
            last_row: c.row,
            last_len: c.len,
        });
    }

    fn extend_top(&mut self, c: &LineClass) {
        // Every open item covers the new line: ancestors contain descendants.
        for open in &mut self.stack {
            open.last_row = c.row;
            open.last_len = c.len;
        }
    }

    fn close_while(&mut self, mut pred: impl FnMut(&OpenItem) -> bool) {
        while let Some(top) = self.stack.last() {
            if !pred(top) {
                break;
            }
            let Some(open) = self.stack.pop() else {
                break;
            };
            let node = open.close();
            match self.stack.last_mut() {
                Some(parent) => {
                    parent.last_row = parent.last_row.max(node.range.end.row);
                    if parent.last_row == node.range.end.row {
                        parent.last_len = node.range.end.column;
                    }
                    parent.node.children.push(node);
                }
                None => self.out.push(node),
            }
        }
    }
}

/// List structure of a whole document, produced by the bundled parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineTree {
    items: Vec<ListItemNode>,
}

impl OutlineTree {
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut classifier = OutlineLineClassifier::default();
        let mut builder = OutlineBuilder::new();
        for (row, line) in lines.iter().enumerate() {
            let lc = classifier.classify(row, line.as_ref());
            builder.push(&lc);
        }
        Self {
            items: builder.finish(),
        }
    }
}

impl SyntaxTree for OutlineTree {
    fn list_items(&self) -> &[ListItemNode] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(text: &str) -> OutlineTree {
        let lines: Vec<&str> = text.lines().collect();
        OutlineTree::parse(&lines)
    }

    #[rstest]
    #[case("- item", Some((ListMarker::Bullet('-'), 0, 2)))]
    #[case("  * item", Some((ListMarker::Bullet('*'), 2, 4)))]
    #[case("+   spaced", Some((ListMarker::Bullet('+'), 0, 4)))]
    #[case("12. twelve", Some((ListMarker::Ordered { number: 12, delimiter: '.' }, 0, 4)))]
    #[case("3) three", Some((ListMarker::Ordered { number: 3, delimiter: ')' }, 0, 3)))]
    #[case("-", Some((ListMarker::Bullet('-'), 0, 2)))]
    #[case("- ", Some((ListMarker::Bullet('-'), 0, 2)))]
    #[case("-item", None)]
    #[case("1.item", None)]
    #[case("text", None)]
    fn recognises_list_markers(
        #[case] line: &str,
        #[case] expected: Option<(ListMarker, usize, usize)>,
    ) {
        let got = parse_list_marker(line).map(|l| (l.marker, l.marker_column, l.content_column));
        assert_eq!(got, expected);
    }

    #[test]
    fn flat_list_has_three_roots() {
        let tree = parse("- [ ] Task1\n- [ ] Task2\n- [ ] Task3\n");
        assert_eq!(tree.list_items().len(), 3);
        assert!(tree.list_items().iter().all(|n| n.children.is_empty()));
        assert_eq!(
            tree.list_items()[1].range,
            Range::new(Position::new(1, 0), Position::new(1, 11))
        );
    }

    #[test]
    fn nested_items_extend_parent_range() {
        let tree = parse("- parent\n  - child\n    - grandchild\n- next");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 2);
        let parent = &roots[0];
        assert_eq!(parent.range.end, Position::new(2, 16));
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].children[0].marker_column(), 4);
    }

    #[test]
    fn misaligned_child_still_nests() {
        let tree = parse("- Parent\n - Bad child");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].marker_column(), 1);
    }

    #[test]
    fn continuation_lines_belong_to_deepest_item() {
        let tree = parse("- a\n  - b\n    more b\n  more a\n");
        let a = &tree.list_items()[0];
        let b = &a.children[0];
        assert_eq!(b.range.end, Position::new(2, 10));
        assert_eq!(a.range.end, Position::new(3, 8));
    }

    #[test]
    fn lazy_continuation_without_blank_line() {
        let tree = parse("- a\nlazy\n");
        assert_eq!(tree.list_items()[0].range.end, Position::new(1, 4));
    }

    #[test]
    fn paragraph_after_blank_closes_list() {
        let tree = parse("- a\n\nparagraph\n- b\n");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].range.end, Position::new(0, 3));
    }

    #[test]
    fn blank_lines_do_not_extend_ranges() {
        let tree = parse("- a\n\n  - b\n");
        let a = &tree.list_items()[0];
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.range.end, Position::new(2, 5));
    }

    #[test]
    fn fenced_code_never_opens_items() {
        let tree = parse("- a\n  ```\n  - [ ] not an item\n  ```\n- b\n");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 2);
        assert!(roots[0].children.is_empty());
        assert_eq!(roots[0].range.end.row, 3);
    }

    #[test]
    fn headings_close_lists() {
        let tree = parse("- a\n# Heading\n  - b\n");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[1].marker_column(), 2);
    }

    #[rstest]
    #[case("# Title", true)]
    #[case("###### Six", true)]
    #[case("#", true)]
    #[case("####### seven", false)]
    #[case("#urgent", false)]
    #[case("#1 on the list", false)]
    fn atx_headings_need_a_space(#[case] line: &str, #[case] expected: bool) {
        assert_eq!(is_atx_heading(line), expected);
    }

    #[test]
    fn hashtag_continuation_keeps_the_list_open() {
        let tree = parse("- [ ] a\n  #urgent\n  - [ ] b\n");
        let roots = tree.list_items();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 1);
        assert_eq!(roots[0].children[0].row(), 2);
    }

    #[test]
    fn ids_are_structural() {
        let text = "- a\n  - b\n";
        assert_eq!(parse(text), parse(text));
        assert_eq!(parse(text).list_items()[0].children[0].id, NodeId { row: 1, column: 2 });
    }

    #[test]
    fn unicode_columns_are_in_chars() {
        let tree = parse("- □ tâche\n  - ✔ fait");
        let root = &tree.list_items()[0];
        assert_eq!(root.range.end, Position::new(1, 10));
        assert_eq!(root.children[0].content_column, 4);
    }
}
