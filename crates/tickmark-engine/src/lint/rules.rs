//! Built-in indentation checks.

use super::{IssueCode, ValidationContext, Validator, ValidatorOptions, ValidatorRegistry};

/// Nested markers may sit up to this many columns right of the parent's
/// content before they are flagged.
const MAX_EXTRA_INDENT: usize = 3;

pub(crate) fn register_builtins(registry: &mut ValidatorRegistry) {
    registry.register_validator(|| Box::new(ShallowIndent), ValidatorOptions::default());
    registry.register_validator(|| Box::new(DeepIndent), ValidatorOptions::default());
    registry.register_validator(|| Box::new(InconsistentMarker), ValidatorOptions::default());
}

pub struct ShallowIndent;

impl Validator for ShallowIndent {
    fn name(&self) -> &str {
        "indent-shallow"
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>) -> bool {
        let Some(parent) = ctx.parent else {
            return false;
        };
        let column = ctx.node.marker_column();
        if column >= parent.content_column {
            return false;
        }
        let fix = ctx.reindent_fix(parent.content_column);
        ctx.report_with_fix(
            IssueCode::IndentShallow,
            column,
            format!(
                "marker at column {}, parent content at column {}",
                column + 1,
                parent.content_column + 1
            ),
            fix,
        );
        true
    }
}

pub struct DeepIndent;

impl Validator for DeepIndent {
    fn name(&self) -> &str {
        "indent-deep"
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>) -> bool {
        let Some(parent) = ctx.parent else {
            return false;
        };
        let column = ctx.node.marker_column();
        if column <= parent.content_column + MAX_EXTRA_INDENT {
            return false;
        }
        let fix = ctx.reindent_fix(parent.content_column);
        ctx.report_with_fix(
            IssueCode::IndentDeep,
            column,
            format!(
                "marker at column {}, parent content at column {}",
                column + 1,
                parent.content_column + 1
            ),
            fix,
        );
        true
    }
}

/// Flags an item whose nearest earlier sibling at the same column switches
/// between ordered and unordered markers.
pub struct InconsistentMarker;

impl Validator for InconsistentMarker {
    fn name(&self) -> &str {
        "inconsistent-marker"
    }

    fn validate(&mut self, ctx: &mut ValidationContext<'_>) -> bool {
        let column = ctx.node.marker_column();
        let Some(previous) = ctx
            .earlier_siblings
            .iter()
            .rev()
            .find(|s| s.marker_column() == column)
        else {
            return false;
        };
        if previous.marker.is_ordered() == ctx.node.marker.is_ordered() {
            return false;
        }
        let detail = format!(
            "'{}' follows '{}' on row {}",
            ctx.node.marker,
            previous.marker,
            previous.row() + 1
        );
        ctx.report(IssueCode::InconsistentMarker, column, detail);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::lint::{IssueCode, Linter, LinterConfig};
    use crate::parsing::OutlineTree;
    use crate::position::Range;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn codes(text: &str) -> Vec<(usize, IssueCode)> {
        let lines: Vec<&str> = text.lines().collect();
        Linter::new(LinterConfig::default())
            .lint(&OutlineTree::parse(&lines), &lines)
            .into_iter()
            .map(|i| (i.range.start.row, i.code))
            .collect()
    }

    #[rstest]
    #[case("- a\n  - b", vec![])]
    #[case("- a\n     - b", vec![])]
    #[case("- a\n      - b", vec![(1, IssueCode::IndentDeep)])]
    #[case("- a\n - b", vec![(1, IssueCode::IndentShallow)])]
    #[case("10. a\n   - b", vec![(1, IssueCode::IndentShallow)])]
    #[case("10. a\n    - b", vec![])]
    #[case("- a\n- b\n1. c", vec![(2, IssueCode::InconsistentMarker)])]
    #[case("1. a\n2. b\n* c\n+ d", vec![(2, IssueCode::InconsistentMarker)])]
    fn builtin_checks(#[case] text: &str, #[case] expected: Vec<(usize, IssueCode)>) {
        assert_eq!(codes(text), expected);
    }

    #[test]
    fn indentation_fix_targets_parent_content_column() {
        let lines = ["- [ ] parent", " - child"];
        let issues = Linter::new(LinterConfig::default()).lint(&OutlineTree::parse(&lines), &lines);
        let fix = issues[0].fix.clone().unwrap();
        assert_eq!(fix.range, Range::on_row(1, 0, 1));
        assert_eq!(fix.replacement, "  ");
    }

    #[test]
    fn marker_mix_has_no_fix() {
        let lines = ["- a", "1. b"];
        let issues = Linter::new(LinterConfig::default()).lint(&OutlineTree::parse(&lines), &lines);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].fix.is_none());
    }
}
