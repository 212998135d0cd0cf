use crate::parsing::ListItemNode;
use crate::position::Range;

use super::{Fix, IssueCode};

/// Priority the built-in validators register with.
pub const DEFAULT_PRIORITY: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Lower runs first.
    pub priority: i32,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
        }
    }
}

/// An issue as raised by a validator, before severity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub code: IssueCode,
    pub row: usize,
    pub column: usize,
    pub detail: String,
    pub fix: Option<Fix>,
}

/// What a validator sees of one list item.
pub struct ValidationContext<'a> {
    pub node: &'a ListItemNode,
    pub parent: Option<&'a ListItemNode>,
    /// Siblings that come before `node`, in document order.
    pub earlier_siblings: &'a [ListItemNode],
    pub row: usize,
    pub line: &'a str,
    reports: Vec<Report>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        node: &'a ListItemNode,
        parent: Option<&'a ListItemNode>,
        earlier_siblings: &'a [ListItemNode],
        line: &'a str,
    ) -> Self {
        Self {
            node,
            parent,
            earlier_siblings,
            row: node.row(),
            line,
            reports: Vec::new(),
        }
    }

    pub fn report(&mut self, code: IssueCode, column: usize, detail: impl Into<String>) {
        self.push(code, column, detail.into(), None);
    }

    pub fn report_with_fix(
        &mut self,
        code: IssueCode,
        column: usize,
        detail: impl Into<String>,
        fix: Fix,
    ) {
        self.push(code, column, detail.into(), Some(fix));
    }

    /// A fix that rewrites this line's leading whitespace to `width` spaces.
    pub fn reindent_fix(&self, width: usize) -> Fix {
        Fix {
            range: Range::on_row(self.row, 0, self.node.marker_column()),
            replacement: " ".repeat(width),
        }
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub(crate) fn into_reports(self) -> Vec<Report> {
        self.reports
    }

    fn push(&mut self, code: IssueCode, column: usize, detail: String, fix: Option<Fix>) {
        self.reports.push(Report {
            code,
            row: self.row,
            column,
            detail,
            fix,
        });
    }
}

pub trait Validator {
    fn name(&self) -> &str;

    /// Checks one item. Returning `true` means the validator matched and
    /// lower-priority validators are skipped for this item.
    fn validate(&mut self, ctx: &mut ValidationContext<'_>) -> bool;
}

type Factory = Box<dyn Fn() -> Box<dyn Validator> + Send + Sync>;

struct Registration {
    priority: i32,
    factory: Factory,
}

/// Validator factories in run order. A fresh set of validators is built for
/// every lint pass.
#[derive(Default)]
pub struct ValidatorRegistry {
    registrations: Vec<Registration>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::rules::register_builtins(&mut registry);
        registry
    }

    pub fn register_validator<F>(&mut self, factory: F, options: ValidatorOptions)
    where
        F: Fn() -> Box<dyn Validator> + Send + Sync + 'static,
    {
        // Equal priorities keep registration order.
        let at = self
            .registrations
            .partition_point(|r| r.priority <= options.priority);
        self.registrations.insert(
            at,
            Registration {
                priority: options.priority,
                factory: Box::new(factory),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub(crate) fn instantiate(&self) -> Vec<Box<dyn Validator>> {
        self.registrations.iter().map(|r| (r.factory)()).collect()
    }

    /// Validator names in run order.
    pub fn names(&self) -> Vec<String> {
        self.instantiate()
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.names())
            .finish()
    }
}
