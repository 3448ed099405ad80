//! Block balance, unreachable code and empty-block tracking

use crate::analysis::line::{self, BlockEnd, BlockType, Branch, LineClass};
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity, DiagnosticTag};

use super::{codes, diagnostic, line_span};

/// Statements between a block start (or branch) and the next branch or end
struct Segment {
    label: &'static str,
    is_branch: bool,
    line: usize,
    has_content: bool,
    /// Text before the first `Case` of a `Select`
    exempt: bool,
}

struct Frame {
    block: BlockType,
    line: usize,
    segment: Segment,
}

pub(super) struct BlockTracker<'a> {
    lines: &'a [&'a str],
    stack: Vec<Frame>,
    /// Set after `Return`/`Throw`, indexed by stack depth
    unreachable: Vec<bool>,
}

impl<'a> BlockTracker<'a> {
    pub(super) fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            stack: Vec::new(),
            unreachable: vec![false],
        }
    }

    /// Innermost frame that is not a `#Region`
    fn enclosing(&self) -> Option<BlockType> {
        self.stack
            .iter()
            .rev()
            .map(|frame| frame.block)
            .find(|block| *block != BlockType::Region)
    }

    pub(super) fn in_enum(&self) -> bool {
        self.enclosing() == Some(BlockType::Enum)
    }

    pub(super) fn in_method(&self) -> bool {
        self.stack.iter().any(|frame| frame.block.is_method_like())
    }

    pub(super) fn step(&mut self, index: usize, class: &LineClass, out: &mut Vec<Diagnostic>) {
        match class {
            LineClass::Empty => {}
            LineClass::BlockEnd(end) => self.close(index, end, out),
            LineClass::Header(header) => {
                self.mark_content();
                let inside_interface = self.enclosing() == Some(BlockType::Interface);
                let next_code = line::next_code_line(self.lines, index);
                if header.opens_block(inside_interface, next_code) {
                    self.push(header.block, index);
                }
            }
            LineClass::Region { .. } => self.push(BlockType::Region, index),
            LineClass::Control(control) if control.single_line => self.statement(index, false, out),
            LineClass::Control(control) => {
                self.mark_content();
                self.push(control.block, index);
            }
            LineClass::Branch(branch) => self.branch(index, *branch, out),
            LineClass::Plain => {
                let terminator = line::is_terminator(line::strip_comment(self.lines[index]).trim());
                self.statement(index, terminator, out);
            }
            LineClass::Imports { .. } | LineClass::Implements(_) | LineClass::Declaration(_) => {
                self.statement(index, false, out)
            }
        }
    }

    /// Report every frame still open at EOF
    pub(super) fn finish(&mut self, out: &mut Vec<Diagnostic>) {
        for frame in std::mem::take(&mut self.stack) {
            out.push(diagnostic(
                DiagnosticSeverity::Error,
                codes::MISSING_CLOSING,
                line_span(frame.line, self.lines[frame.line]),
                format!(
                    "Missing closing statement '{}' for '{}' opened at line {}",
                    frame.block.closing_statement(),
                    frame.block.keyword(),
                    frame.line + 1
                ),
            ));
        }
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn set_unreachable(&mut self, depth: usize, value: bool) {
        if self.unreachable.len() <= depth {
            self.unreachable.resize(depth + 1, false);
        }
        self.unreachable[depth] = value;
    }

    fn mark_content(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            frame.segment.has_content = true;
        }
    }

    fn statement(&mut self, index: usize, terminator: bool, out: &mut Vec<Diagnostic>) {
        self.mark_content();
        let depth = self.depth();
        if self.unreachable.get(depth).copied().unwrap_or(false) {
            out.push(
                diagnostic(
                    DiagnosticSeverity::Warning,
                    codes::UNREACHABLE_CODE,
                    line_span(index, self.lines[index]),
                    "Unreachable code",
                )
                .with_tag(DiagnosticTag::Unnecessary),
            );
        }
        if terminator {
            self.set_unreachable(depth, true);
        }
    }

    fn push(&mut self, block: BlockType, index: usize) {
        let depth = self.depth();
        self.set_unreachable(depth, false);
        self.stack.push(Frame {
            block,
            line: index,
            segment: Segment {
                label: block.keyword(),
                is_branch: false,
                line: index,
                has_content: false,
                exempt: block == BlockType::Select,
            },
        });
        self.set_unreachable(depth + 1, false);
    }

    fn close(&mut self, index: usize, end: &BlockEnd, out: &mut Vec<Diagnostic>) {
        let span = line_span(index, self.lines[index]);
        let Some(top) = self.stack.last() else {
            out.push(diagnostic(
                DiagnosticSeverity::Error,
                codes::UNEXPECTED_CLOSING,
                span,
                format!("Unexpected closing statement '{}'", end.statement),
            ));
            return;
        };

        if top.block != end.block {
            // The open frame is kept; the closing may belong further out
            out.push(diagnostic(
                DiagnosticSeverity::Error,
                codes::MISMATCHED_BLOCK,
                span,
                format!(
                    "Mismatched block: expected '{}' to close '{}' opened at line {}, found '{}'",
                    top.block.closing_statement(),
                    top.block.keyword(),
                    top.line + 1,
                    end.statement
                ),
            ));
            return;
        }

        if let Some(frame) = self.stack.pop() {
            self.check_empty_segment(frame.block, &frame.segment, out);
        }
        let depth = self.depth();
        self.unreachable.truncate(depth + 1);
        self.set_unreachable(depth, false);
    }

    fn branch(&mut self, index: usize, branch: Branch, out: &mut Vec<Diagnostic>) {
        let Some(frame) = self.stack.last() else {
            return;
        };
        if !frame.block.is_control() {
            return;
        }
        self.check_empty_segment(frame.block, &frame.segment, out);

        let depth = self.depth();
        if let Some(frame) = self.stack.last_mut() {
            frame.segment = Segment {
                label: branch.keyword(),
                is_branch: true,
                line: index,
                has_content: false,
                exempt: false,
            };
        }
        self.set_unreachable(depth, false);
    }

    fn check_empty_segment(&self, block: BlockType, segment: &Segment, out: &mut Vec<Diagnostic>) {
        if !block.is_control() || segment.has_content || segment.exempt {
            return;
        }
        let what = if segment.is_branch { "branch" } else { "block" };
        out.push(diagnostic(
            DiagnosticSeverity::Information,
            codes::EMPTY_BLOCK,
            line_span(segment.line, self.lines[segment.line]),
            format!("Empty '{}' {}", segment.label, what),
        ));
    }
}
