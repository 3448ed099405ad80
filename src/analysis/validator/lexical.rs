//! Line-local checks that do not depend on block balance

use serde_json::json;

use crate::analysis::line::{self, BlockType, Declaration, Header, LineClass, char_col};
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};
use crate::models::position::Range;

use super::{ValidationOptions, codes, diagnostic, line_span};

pub(super) struct LineContext<'a> {
    pub index: usize,
    pub raw: &'a str,
    /// `raw` truncated at its comment
    pub code: &'a str,
    /// `None` for blank and continuation lines
    pub class: Option<&'a LineClass>,
    pub in_enum: bool,
    pub in_method: bool,
}

impl LineContext<'_> {
    /// Range of `len` bytes starting at byte `offset` of the line
    fn span(&self, offset: usize, len: usize) -> Range {
        Range::on_line(
            self.index as u32,
            char_col(self.raw, offset),
            char_col(self.raw, offset + len),
        )
    }

    fn is_const(&self) -> bool {
        matches!(self.class, Some(LineClass::Declaration(d)) if d.is_const())
    }
}

pub(super) fn check_line(ctx: &LineContext<'_>, options: &ValidationOptions, out: &mut Vec<Diagnostic>) {
    check_length(ctx, options.max_line_length, out);
    check_todo(ctx, out);
    if !ctx.in_enum && !ctx.is_const() {
        check_magic_numbers(ctx, out);
    }

    match ctx.class {
        Some(LineClass::Control(control))
            if control.block == BlockType::If && !control.has_then && !line::is_continued(ctx.code) =>
        {
            out.push(diagnostic(
                DiagnosticSeverity::Error,
                codes::MISSING_THEN,
                line_span(ctx.index, ctx.raw),
                "'If' statement is missing 'Then'",
            ));
        }
        Some(LineClass::Declaration(declaration)) => check_declaration(ctx, declaration, out),
        Some(LineClass::Header(header)) => check_return_type(ctx, header, out),
        _ => {}
    }
}

fn check_length(ctx: &LineContext<'_>, max: usize, out: &mut Vec<Diagnostic>) {
    let length = ctx.raw.chars().count();
    if length <= max {
        return;
    }
    out.push(diagnostic(
        DiagnosticSeverity::Warning,
        codes::LINE_TOO_LONG,
        Range::on_line(ctx.index as u32, max as u32, length as u32),
        format!("Line is {} characters long (maximum {})", length, max),
    ));
}

fn check_todo(ctx: &LineContext<'_>, out: &mut Vec<Diagnostic>) {
    let Some(comment) = line::comment_part(ctx.raw) else {
        return;
    };
    let Some((offset, _)) = line::todo_marker(comment) else {
        return;
    };
    let text = comment[offset..].trim_end();
    out.push(diagnostic(
        DiagnosticSeverity::Information,
        codes::TODO_COMMENT,
        ctx.span(ctx.code.len() + 1 + offset, text.len()),
        text,
    ));
}

fn check_magic_numbers(ctx: &LineContext<'_>, out: &mut Vec<Diagnostic>) {
    let masked = line::mask_strings(ctx.code);
    for (offset, literal) in line::numeric_literals(&masked) {
        let digits = literal.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        if digits == "0" || digits == "1" {
            continue;
        }
        out.push(
            diagnostic(
                DiagnosticSeverity::Information,
                codes::MAGIC_NUMBER,
                ctx.span(offset, literal.len()),
                format!("Magic number {}; consider a named constant", literal),
            )
            .with_data(json!({ "magicNumber": literal })),
        );
    }
}

fn check_declaration(ctx: &LineContext<'_>, declaration: &Declaration, out: &mut Vec<Diagnostic>) {
    let is_local = declaration.is_dim() || declaration.has_modifier("Static");

    for declarator in &declaration.declarators {
        let span = ctx.span(declarator.offset, declarator.name.len());

        if declaration.is_const() {
            if !declarator.has_initializer {
                out.push(diagnostic(
                    DiagnosticSeverity::Error,
                    codes::UNINITIALIZED_CONST,
                    span,
                    format!("Constant '{}' must be initialized", declarator.name),
                ));
            }
            continue;
        }

        if is_local && declarator.effective_type.is_none() && !declarator.has_initializer {
            out.push(diagnostic(
                DiagnosticSeverity::Warning,
                codes::UNTYPED_VARIABLE,
                span,
                format!("Variable '{}' is declared without a type ('As <Type>')", declarator.name),
            ));
        }

        if declaration.is_dim() && ctx.in_method && is_pascal_case(&declarator.name) {
            out.push(diagnostic(
                DiagnosticSeverity::Information,
                codes::NAMING_CONVENTION,
                span,
                format!("Local variable '{}' should be camelCase", declarator.name),
            ));
        }
    }
}

fn check_return_type(ctx: &LineContext<'_>, header: &Header, out: &mut Vec<Diagnostic>) {
    if !matches!(header.block, BlockType::Function | BlockType::Property)
        || header.return_type.is_some()
        || header.continued
    {
        return;
    }
    out.push(diagnostic(
        DiagnosticSeverity::Warning,
        codes::MISSING_RETURN_TYPE,
        ctx.span(header.name_offset, header.name.len()),
        format!(
            "{} '{}' is missing a return type ('As <Type>')",
            header.block.keyword(),
            header.name
        ),
    ));
}

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
        && name.chars().any(|c| c.is_lowercase())
}
