//! # Indentation linter
//!
//! Checks nested list alignment straight off the syntax tree; no todo map is
//! needed. Checks are [`Validator`]s held in a [`ValidatorRegistry`] and run
//! in priority order for every list item.

pub mod registry;
pub mod rules;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parsing::{ListItemNode, SyntaxTree};
use crate::position::Range;

pub use registry::{
    DEFAULT_PRIORITY, Report, ValidationContext, Validator, ValidatorOptions, ValidatorRegistry,
};

/// Namespace diagnostics are published under.
pub const NAMESPACE: &str = "tickmark.lint";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum IssueCode {
    IndentShallow,
    IndentDeep,
    InconsistentMarker,
    /// Reported by a validator registered from outside the engine.
    Custom(String),
}

impl IssueCode {
    pub fn as_str(&self) -> &str {
        match self {
            IssueCode::IndentShallow => "INDENT_SHALLOW",
            IssueCode::IndentDeep => "INDENT_DEEP",
            IssueCode::InconsistentMarker => "INCONSISTENT_MARKER",
            IssueCode::Custom(code) => code,
        }
    }

    fn summary(&self) -> &str {
        match self {
            IssueCode::IndentShallow => "List marker is left of the parent item's content",
            IssueCode::IndentDeep => "List marker is indented too far past the parent item's content",
            IssueCode::InconsistentMarker => "Sibling list items mix ordered and unordered markers",
            IssueCode::Custom(code) => code,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    Warning,
    Info,
    Hint,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Hint => "hint",
        };
        f.write_str(s)
    }
}

/// A text replacement that resolves an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub range: Range,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub code: IssueCode,
    pub message: String,
    pub severity: Severity,
    pub range: Range,
    pub fix: Option<Fix>,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.range.start, self.severity, self.code, self.message
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinterConfig {
    pub enabled: bool,
    /// Severity per issue code, e.g. `INDENT_DEEP = "info"`.
    pub severity: BTreeMap<String, Severity>,
}

impl Default for LinterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: BTreeMap::new(),
        }
    }
}

impl LinterConfig {
    pub fn severity_for(&self, code: &IssueCode) -> Severity {
        self.severity.get(code.as_str()).copied().unwrap_or_default()
    }
}

/// Where diagnostics end up.
pub trait DiagnosticsSink {
    /// Replaces everything previously published under `namespace`.
    fn publish(&mut self, namespace: &str, issues: &[LintIssue]);
}

/// Keeps every publication in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub published: BTreeMap<String, Vec<LintIssue>>,
}

impl DiagnosticsSink for CollectingSink {
    fn publish(&mut self, namespace: &str, issues: &[LintIssue]) {
        self.published.insert(namespace.to_string(), issues.to_vec());
    }
}

/// Writes each diagnostic to the log at a level matching its severity.
#[derive(Debug, Default)]
pub struct LogSink {
    pub source: String,
}

impl DiagnosticsSink for LogSink {
    fn publish(&mut self, namespace: &str, issues: &[LintIssue]) {
        for issue in issues {
            let level = match issue.severity {
                Severity::Error => log::Level::Error,
                Severity::Warning => log::Level::Warn,
                Severity::Info => log::Level::Info,
                Severity::Hint => log::Level::Debug,
            };
            log::log!(target: namespace, level, "{}:{issue}", self.source);
        }
    }
}

/// Runs the registered validators over a syntax tree.
pub struct Linter {
    config: LinterConfig,
    registry: ValidatorRegistry,
}

impl Linter {
    /// A linter with the built-in indentation checks.
    pub fn new(config: LinterConfig) -> Self {
        Self::with_registry(config, ValidatorRegistry::with_builtins())
    }

    pub fn with_registry(config: LinterConfig, registry: ValidatorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn registry_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.registry
    }

    pub fn lint<T, S>(&self, tree: &T, lines: &[S]) -> Vec<LintIssue>
    where
        T: SyntaxTree + ?Sized,
        S: AsRef<str>,
    {
        if !self.config.enabled {
            return Vec::new();
        }

        let mut validators = self.registry.instantiate();
        let mut reports = Vec::new();
        walk(tree.list_items(), None, lines, &mut validators, &mut reports);

        let issues: Vec<LintIssue> = reports
            .into_iter()
            .map(|r| self.to_issue(r, lines))
            .collect();
        log::debug!("lint found {} issues", issues.len());
        issues
    }

    /// Lints and hands the result to `sink` under [`NAMESPACE`]. Returns the
    /// number of issues published.
    pub fn publish<T, S>(&self, tree: &T, lines: &[S], sink: &mut dyn DiagnosticsSink) -> usize
    where
        T: SyntaxTree + ?Sized,
        S: AsRef<str>,
    {
        let issues = self.lint(tree, lines);
        sink.publish(NAMESPACE, &issues);
        issues.len()
    }

    fn to_issue<S: AsRef<str>>(&self, report: Report, lines: &[S]) -> LintIssue {
        let line_len = lines
            .get(report.row)
            .map(|l| l.as_ref().chars().count())
            .unwrap_or(0);
        let message = if report.detail.is_empty() {
            report.code.summary().to_string()
        } else {
            format!("{}: {}", report.code.summary(), report.detail)
        };
        LintIssue {
            severity: self.config.severity_for(&report.code),
            range: Range::on_row(report.row, report.column, line_len.max(report.column)),
            code: report.code,
            message,
            fix: report.fix,
        }
    }
}

fn walk<S: AsRef<str>>(
    siblings: &[ListItemNode],
    parent: Option<&ListItemNode>,
    lines: &[S],
    validators: &mut [Box<dyn Validator>],
    reports: &mut Vec<Report>,
) {
    for (idx, node) in siblings.iter().enumerate() {
        let mut ctx = ValidationContext::new(
            node,
            parent,
            &siblings[..idx],
            lines.get(node.row()).map(|l| l.as_ref()).unwrap_or(""),
        );
        for validator in validators.iter_mut() {
            if validator.validate(&mut ctx) {
                break;
            }
        }
        reports.extend(ctx.into_reports());
        walk(&node.children, Some(node), lines, validators, reports);
    }
}
