//! Structural and semantic validation
//!
//! One forward pass over the comment-stripped lines runs the lexical checks
//! and a block stack of its own; the tree-based checks (unused variables,
//! interface completeness, cross-file duplicates) run over the symbol tree
//! afterwards. Every diagnostic carries a stable code from [`codes`].

mod blocks;
mod lexical;
mod semantic;

use crate::models::config::ValidationConfig;
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};
use crate::models::document::SiblingTree;
use crate::models::position::Range;

use super::builder::build_symbol_tree;
use super::line::{self, char_col};
use blocks::BlockTracker;
use lexical::LineContext;

/// Stable diagnostic codes
pub mod codes {
    pub const MISSING_THEN: &str = "missing-then";
    pub const UNTYPED_VARIABLE: &str = "untyped-variable";
    pub const UNINITIALIZED_CONST: &str = "uninitialized-const";
    pub const LINE_TOO_LONG: &str = "line-too-long";
    pub const TODO_COMMENT: &str = "todo-comment";
    /// `data.magicNumber` holds the literal text for an extract-to-constant fix
    pub const MAGIC_NUMBER: &str = "magic-number";
    pub const MISSING_RETURN_TYPE: &str = "missing-return-type";
    pub const NAMING_CONVENTION: &str = "naming-convention";
    pub const MISMATCHED_BLOCK: &str = "mismatched-block";
    pub const UNEXPECTED_CLOSING: &str = "unexpected-closing";
    pub const MISSING_CLOSING: &str = "missing-closing";
    pub const UNREACHABLE_CODE: &str = "unreachable-code";
    pub const EMPTY_BLOCK: &str = "empty-block";
    pub const UNUSED_VARIABLE: &str = "unused-variable";
    pub const MISSING_MEMBER: &str = "missing-member";
    pub const DUPLICATE_DECLARATION: &str = "duplicate-declaration";

    pub const ALL: &[&str] = &[
        MISSING_THEN,
        UNTYPED_VARIABLE,
        UNINITIALIZED_CONST,
        LINE_TOO_LONG,
        TODO_COMMENT,
        MAGIC_NUMBER,
        MISSING_RETURN_TYPE,
        NAMING_CONVENTION,
        MISMATCHED_BLOCK,
        UNEXPECTED_CLOSING,
        MISSING_CLOSING,
        UNREACHABLE_CODE,
        EMPTY_BLOCK,
        UNUSED_VARIABLE,
        MISSING_MEMBER,
        DUPLICATE_DECLARATION,
    ];
}

/// Validator tuning
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub max_line_length: usize,
    /// Codes whose diagnostics are dropped
    pub disabled_codes: Vec<String>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_line_length: 120,
            disabled_codes: Vec::new(),
        }
    }
}

impl From<&ValidationConfig> for ValidationOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            max_line_length: config.max_line_length,
            disabled_codes: config.disabled.clone(),
        }
    }
}

impl ValidationOptions {
    fn is_enabled(&self, code: Option<&str>) -> bool {
        code.is_none_or(|code| {
            !self
                .disabled_codes
                .iter()
                .any(|disabled| disabled.eq_ignore_ascii_case(code))
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidationOptions,
}

impl Validator {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    /// Diagnostics for `text`, sorted by position
    ///
    /// `siblings` are the trees of other open documents; an empty slice turns
    /// the cross-file checks into no-ops.
    pub fn validate(&self, text: &str, siblings: &[SiblingTree]) -> Vec<Diagnostic> {
        let lines: Vec<&str> = text.lines().collect();
        let mut out = Vec::new();
        let mut blocks = BlockTracker::new(&lines);
        let mut previous_continued = false;

        for (index, raw) in lines.iter().enumerate() {
            let code = line::strip_comment(raw);
            let continuation = previous_continued;
            if !code.trim().is_empty() {
                previous_continued = line::is_continued(code);
            }

            // Continuation lines only get the line-level checks
            let class = (!continuation && !code.trim().is_empty()).then(|| line::classify(code));
            let context = LineContext {
                index,
                raw,
                code,
                class: class.as_ref(),
                in_enum: blocks.in_enum(),
                in_method: blocks.in_method(),
            };
            lexical::check_line(&context, &self.options, &mut out);

            if let Some(class) = &class {
                blocks.step(index, class, &mut out);
            }
        }
        blocks.finish(&mut out);

        let tree = build_symbol_tree(text);
        semantic::check_unused_variables(&tree, &lines, &mut out);
        semantic::check_interface_members(&tree, siblings, &mut out);
        semantic::check_duplicates(&tree, siblings, &mut out);

        out.retain(|diagnostic| self.options.is_enabled(diagnostic.code()));
        out.sort_by_key(|diagnostic| (diagnostic.range.start.line, diagnostic.range.start.character));

        tracing::debug!(
            "Validated {} lines against {} siblings: {} diagnostics",
            lines.len(),
            siblings.len(),
            out.len()
        );
        out
    }
}

/// Validate with default options
pub fn validate(text: &str, siblings: &[SiblingTree]) -> Vec<Diagnostic> {
    Validator::default().validate(text, siblings)
}

/// Code span of a line: first non-blank character to the end of the
/// comment-stripped text
pub(crate) fn line_span(index: usize, raw: &str) -> Range {
    let code = line::strip_comment(raw).trim_end();
    let indent = code.len() - code.trim_start().len();
    Range::on_line(index as u32, char_col(raw, indent), char_col(raw, code.len()))
}

pub(crate) fn diagnostic(
    severity: DiagnosticSeverity,
    code: &str,
    range: Range,
    message: impl Into<String>,
) -> Diagnostic {
    Diagnostic::new(range, severity, message).with_code(code)
}
