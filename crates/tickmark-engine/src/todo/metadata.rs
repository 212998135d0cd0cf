//! `@tag(value)` annotations on todo lines.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::position::{Range, byte_to_char, char_len};

use super::TodoItem;

static TAG_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([\p{L}\p{Nd}_-]+)\(").expect("tag pattern is valid"));

/// A canonical tag and the alternative spellings that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Known tags, in registration order.
///
/// When two tags claim the same alias the one registered last wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSchema {
    pub tags: Vec<TagDefinition>,
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self::empty()
            .with_tag("priority", &["p"])
            .with_tag("started", &["init"])
            .with_tag("done", &["completed"])
            .with_tag("due", &[])
    }
}

impl MetadataSchema {
    pub fn empty() -> Self {
        Self { tags: Vec::new() }
    }

    pub fn with_tag(mut self, name: &str, aliases: &[&str]) -> Self {
        for alias in aliases {
            if let Some(previous) = self.canonical_for_alias(alias) {
                log::warn!("metadata alias '{alias}' moves from '{previous}' to '{name}'");
            }
        }
        self.tags.push(TagDefinition {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Canonical name `alias` stands for, if it is a registered alias.
    pub fn canonical_for_alias(&self, alias: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|t| t.aliases.iter().any(|a| a == alias))
            .map(|t| t.name.as_str())
    }

    /// Canonical name for any spelling: aliases resolve, everything else maps
    /// to itself.
    pub fn canonical<'a>(&'a self, tag: &'a str) -> &'a str {
        self.canonical_for_alias(tag).unwrap_or(tag)
    }

    /// Aliases claimed by more than one tag, with every claimant in
    /// registration order.
    pub fn alias_conflicts(&self) -> Vec<(String, Vec<String>)> {
        let mut claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for tag in &self.tags {
            for alias in &tag.aliases {
                claims.entry(alias).or_default().push(tag.name.clone());
            }
        }
        claims
            .into_iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(alias, owners)| (alias.to_string(), owners))
            .collect()
    }
}

/// One `@tag(value)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    /// The tag exactly as written.
    pub tag: String,
    pub value: String,
    /// Canonical name when `tag` is an alias.
    pub alias_for: Option<String>,
    /// From the `@` to one past the closing `)`.
    pub range: Range,
    /// Character column of the `@`.
    pub position_in_line: usize,
}

impl MetadataEntry {
    /// The name this entry is filed under: the alias target or the tag itself.
    pub fn canonical_tag(&self) -> &str {
        self.alias_for.as_deref().unwrap_or(&self.tag)
    }
}

/// All tags of an item: every occurrence in scan order plus a lookup where the
/// last occurrence of a tag wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataSet {
    pub entries: Vec<MetadataEntry>,
    pub by_tag: BTreeMap<String, MetadataEntry>,
}

impl MetadataSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, tag: &str) -> Option<&MetadataEntry> {
        self.by_tag.get(tag)
    }

    pub fn value(&self, tag: &str) -> Option<&str> {
        self.get(tag).map(|e| e.value.as_str())
    }

    pub fn push(&mut self, entry: MetadataEntry) {
        if let Some(canonical) = &entry.alias_for {
            self.by_tag.insert(canonical.clone(), entry.clone());
        }
        self.by_tag.insert(entry.tag.clone(), entry.clone());
        self.entries.push(entry);
    }

    /// Appends another line's entries after this one's.
    pub fn merge(&mut self, other: MetadataSet) {
        for entry in other.entries {
            self.push(entry);
        }
    }

    /// Entries whose literal or canonical tag is `tag` (or an alias of it).
    pub fn matching<'a>(
        &'a self,
        tag: &'a str,
        schema: &'a MetadataSchema,
    ) -> impl Iterator<Item = &'a MetadataEntry> + 'a {
        let wanted = schema.canonical(tag);
        self.entries
            .iter()
            .filter(move |e| e.tag == tag || e.canonical_tag() == wanted)
    }
}

/// Finds the `)` closing a value that starts at byte `from`, honouring nested
/// parentheses and backslash escapes. Returns its byte offset.
fn find_closing_paren(line: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (idx, c) in line[from..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' if depth == 0 => return Some(from + idx),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Extracts every `@tag(value)` of `line`, which sits on document row `row`.
pub fn extract_metadata(line: &str, row: usize, schema: &MetadataSchema) -> MetadataSet {
    let mut set = MetadataSet::default();
    let mut search_from = 0;

    while let Some(caps) = TAG_START.captures_at(line, search_from) {
        let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let Some(close) = find_closing_paren(line, whole.end()) else {
            // Unterminated: skip past this `@` and keep scanning.
            search_from = whole.start() + 1;
            continue;
        };

        let start = byte_to_char(line, whole.start());
        let span_len = char_len(&line[whole.start()..=close]);
        let tag = tag.as_str();

        set.push(MetadataEntry {
            tag: tag.to_string(),
            value: line[whole.end()..close].trim().to_string(),
            alias_for: schema.canonical_for_alias(tag).map(str::to_string),
            range: Range::on_row(row, start, start + span_len),
            position_in_line: start,
        });
        search_from = close + 1;
    }

    set
}

/// Reacts to tags being added to or removed from an item.
///
/// Observers run after the edit that added or removed the tag has been
/// applied, in registration order.
pub trait MetadataObserver {
    fn on_add(&self, _item: &TodoItem, _entry: &MetadataEntry) {}
    fn on_remove(&self, _item: &TodoItem, _entry: &MetadataEntry) {}
}

/// Ordered observer list, optionally scoped to one canonical tag each.
#[derive(Default)]
pub struct MetadataObservers {
    observers: Vec<(Option<String>, Box<dyn MetadataObserver>)>,
}

impl std::fmt::Debug for MetadataObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataObservers")
            .field("len", &self.observers.len())
            .finish()
    }
}

impl MetadataObservers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes every tag.
    pub fn register(&mut self, observer: impl MetadataObserver + 'static) {
        self.observers.push((None, Box::new(observer)));
    }

    /// Observes one canonical tag (aliases included).
    pub fn register_for(&mut self, tag: &str, observer: impl MetadataObserver + 'static) {
        self.observers.push((Some(tag.to_string()), Box::new(observer)));
    }

    pub fn notify_add(&self, item: &TodoItem, entry: &MetadataEntry) {
        for observer in self.interested(entry) {
            observer.on_add(item, entry);
        }
    }

    pub fn notify_remove(&self, item: &TodoItem, entry: &MetadataEntry) {
        for observer in self.interested(entry) {
            observer.on_remove(item, entry);
        }
    }

    fn interested<'a>(
        &'a self,
        entry: &'a MetadataEntry,
    ) -> impl Iterator<Item = &'a dyn MetadataObserver> + 'a {
        self.observers
            .iter()
            .filter(move |(scope, _)| match scope {
                Some(tag) => tag == entry.canonical_tag(),
                None => true,
            })
            .map(|(_, o)| o.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn extracts_tags_in_scan_order() {
        let set = extract_metadata(
            "- □ Task @priority(high) @due(2023-04-01)",
            0,
            &MetadataSchema::default(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.entries[0].tag, "priority");
        assert_eq!(set.entries[1].tag, "due");
        assert_eq!(set.value("priority"), Some("high"));
        assert_eq!(set.value("due"), Some("2023-04-01"));
    }

    #[test]
    fn ranges_are_in_characters() {
        let set = extract_metadata("- □ Task @p(1)", 4, &MetadataSchema::default());
        let entry = &set.entries[0];
        assert_eq!(entry.range, Range::on_row(4, 9, 14));
        assert_eq!(entry.position_in_line, 9);
    }

    #[test]
    fn aliases_fill_both_keys() {
        let set = extract_metadata("@p(high)", 0, &MetadataSchema::default());
        let entry = set.get("priority").unwrap();
        assert_eq!(entry.tag, "p");
        assert_eq!(entry.alias_for.as_deref(), Some("priority"));
        assert_eq!(set.value("p"), Some("high"));
    }

    #[test]
    fn last_tag_wins_but_entries_keep_everything() {
        let set = extract_metadata(
            "@priority(low) @p(medium) @priority(high)",
            0,
            &MetadataSchema::default(),
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.value("priority"), Some("high"));
        assert_eq!(set.value("p"), Some("medium"));
        let positions: Vec<usize> = set.entries.iter().map(|e| e.position_in_line).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[rstest]
    #[case("@due( 2024-01-01 )", "2024-01-01")]
    #[case("@note(call (maybe) bob)", "call (maybe) bob")]
    #[case(r"@note(a \) b)", r"a \) b")]
    #[case("@empty()", "")]
    #[case("@tag_with-dash_1(x)", "x")]
    fn value_parsing(#[case] line: &str, #[case] value: &str) {
        let set = extract_metadata(line, 0, &MetadataSchema::empty());
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].value, value);
    }

    #[rstest]
    #[case("no tags here")]
    #[case("@unterminated(value")]
    #[case("@ spaced(x)")]
    #[case("email@example.com")]
    fn no_match(#[case] line: &str) {
        let set = extract_metadata(line, 0, &MetadataSchema::default());
        assert!(set.is_empty());
        assert!(set.by_tag.is_empty());
    }

    #[test]
    fn unterminated_tag_does_not_hide_later_tags() {
        let set = extract_metadata("@broken( @due(today)", 0, &MetadataSchema::empty());
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].tag, "due");
        assert_eq!(set.entries[0].value, "today");
        assert_eq!(set.entries[0].position_in_line, 9);
    }

    #[test]
    fn conflicting_alias_goes_to_last_registered_tag() {
        let schema = MetadataSchema::empty()
            .with_tag("priority", &["p"])
            .with_tag("project", &["p"]);
        assert_eq!(schema.canonical_for_alias("p"), Some("project"));
        assert_eq!(
            schema.alias_conflicts(),
            vec![(
                "p".to_string(),
                vec!["priority".to_string(), "project".to_string()]
            )]
        );
    }

    #[test]
    fn merge_keeps_line_order() {
        let schema = MetadataSchema::default();
        let mut set = extract_metadata("@due(a)", 0, &schema);
        set.merge(extract_metadata("@due(b) @started(c)", 1, &schema));
        assert_eq!(set.len(), 3);
        assert_eq!(set.value("due"), Some("b"));
        assert_eq!(set.get("due").unwrap().range.start.row, 1);
    }

    #[test]
    fn matching_resolves_aliases_both_ways() {
        let schema = MetadataSchema::default();
        let set = extract_metadata("@p(1) @priority(2) @due(3)", 0, &schema);
        assert_eq!(set.matching("priority", &schema).count(), 2);
        assert_eq!(set.matching("p", &schema).count(), 2);
        assert_eq!(set.matching("due", &schema).count(), 1);
    }
}
