//! Symbol tree construction
//!
//! A single forward pass over comment-stripped lines with a block stack.
//! Nodes live in an index arena while the pass runs and are assembled into
//! the owned tree at the end. The builder never reports imbalance; unmatched
//! closings are ignored and unclosed blocks end at the last line.

use crate::models::position::{Position, Range};
use crate::models::symbol::{ARGUMENT_DETAIL_PREFIX, IMPLEMENTS_DETAIL_PREFIX, Symbol, SymbolKind};

use super::line::{
    self, BlockEnd, BlockType, Declaration, Header, LineClass, char_col, parse_arguments,
};

/// Build the symbol forest of a document
pub fn build_symbol_tree(text: &str) -> Vec<Symbol> {
    SymbolBuilder::new(text).build()
}

struct Node {
    symbol: Symbol,
    children: Vec<usize>,
}

struct Frame {
    block: BlockType,
    node: usize,
}

pub struct SymbolBuilder<'a> {
    lines: Vec<&'a str>,
    nodes: Vec<Node>,
    roots: Vec<usize>,
    stack: Vec<Frame>,
}

impl<'a> SymbolBuilder<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            nodes: Vec::new(),
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn build(mut self) -> Vec<Symbol> {
        let mut previous_continued = false;

        for index in 0..self.lines.len() {
            let code = line::strip_comment(self.lines[index]);
            if code.trim().is_empty() {
                continue;
            }
            // Physical lines after `_` belong to the previous statement
            let continuation = previous_continued;
            previous_continued = line::is_continued(code);
            if continuation {
                continue;
            }

            match line::classify(code) {
                LineClass::BlockEnd(end) => self.close_block(index, &end),
                LineClass::Header(header) => self.open_header(index, &header),
                LineClass::Region { name, name_offset } => {
                    let node = self.add_symbol(
                        index,
                        &name,
                        name_offset,
                        SymbolKind::Namespace,
                        BlockType::Region.keyword().to_string(),
                    );
                    self.push(BlockType::Region, node);
                }
                LineClass::Imports { name, offset, .. } => {
                    self.add_symbol(index, &name, offset, SymbolKind::Package, "Imports".to_string());
                }
                LineClass::Implements(names) => {
                    for (name, offset) in names {
                        let base = base_type_name(&name);
                        let detail = format!("{}{}", IMPLEMENTS_DETAIL_PREFIX, name);
                        self.add_symbol(index, base, offset, SymbolKind::Interface, detail);
                    }
                }
                LineClass::Declaration(declaration) => self.add_declaration(index, &declaration),
                _ => {
                    if self.enclosing_block() == Some(BlockType::Enum)
                        && let Some((name, offset)) = line::parse_enum_member(code)
                    {
                        let detail = code.trim().to_string();
                        self.add_symbol(index, &name, offset, SymbolKind::EnumMember, detail);
                    }
                }
            }
        }

        let last_line = self.lines.len().saturating_sub(1);
        let eof = self.line_end(last_line);
        for frame in std::mem::take(&mut self.stack) {
            self.nodes[frame.node].symbol.range.end = eof;
        }

        let roots = self.assemble();
        tracing::debug!(
            "Built {} root symbols from {} lines",
            roots.len(),
            self.lines.len()
        );
        roots
    }

    fn close_block(&mut self, index: usize, end: &BlockEnd) {
        match self.stack.last() {
            Some(top) if top.block == end.block => {
                let node = top.node;
                self.stack.pop();
                self.nodes[node].symbol.range.end = self.line_end(index);
            }
            _ => tracing::trace!("Ignoring unmatched '{}' at line {}", end.statement, index + 1),
        }
    }

    fn open_header(&mut self, index: usize, header: &Header) {
        let Some(kind) = header.block.symbol_kind() else {
            return;
        };
        let inside_interface = self.enclosing_block() == Some(BlockType::Interface);
        let next_code = line::next_code_line(&self.lines, index);
        let opens = header.opens_block(inside_interface, next_code);

        let node = self.add_symbol(index, &header.name, header.name_offset, kind, header.detail());

        if let Some(params) = &header.params {
            for argument in parse_arguments(params, header.params_offset) {
                let detail = format!("{}{}", ARGUMENT_DETAIL_PREFIX, argument.signature);
                let child = self.new_node(
                    index,
                    &argument.name,
                    argument.offset,
                    SymbolKind::Variable,
                    detail,
                );
                self.nodes[node].children.push(child);
            }
        }

        if opens {
            self.push(header.block, node);
        }
    }

    fn add_declaration(&mut self, index: usize, declaration: &Declaration) {
        let kind = if declaration.is_const() {
            SymbolKind::Constant
        } else {
            match self.enclosing_block() {
                Some(block) if block.is_method_like() => SymbolKind::Variable,
                Some(
                    BlockType::Class | BlockType::Module | BlockType::Structure | BlockType::Interface,
                ) => SymbolKind::Field,
                _ => SymbolKind::Variable,
            }
        };

        for declarator in &declaration.declarators {
            let detail = declarator
                .effective_type
                .clone()
                .unwrap_or_else(|| "Object".to_string());
            self.add_symbol(index, &declarator.name, declarator.offset, kind, detail);
        }
    }

    /// Innermost frame that is not a `#Region`
    fn enclosing_block(&self) -> Option<BlockType> {
        self.stack
            .iter()
            .rev()
            .map(|frame| frame.block)
            .find(|block| *block != BlockType::Region)
    }

    fn push(&mut self, block: BlockType, node: usize) {
        // Provisional end; replaced when the block closes
        self.nodes[node].symbol.range.end = self.line_end(self.lines.len().saturating_sub(1));
        self.stack.push(Frame { block, node });
    }

    /// Create a node and attach it to the current frame (or the roots)
    fn add_symbol(
        &mut self,
        index: usize,
        name: &str,
        name_offset: usize,
        kind: SymbolKind,
        detail: String,
    ) -> usize {
        let node = self.new_node(index, name, name_offset, kind, detail);
        match self.stack.last() {
            Some(frame) => self.nodes[frame.node].children.push(node),
            None => self.roots.push(node),
        }
        node
    }

    fn new_node(
        &mut self,
        index: usize,
        name: &str,
        name_offset: usize,
        kind: SymbolKind,
        detail: String,
    ) -> usize {
        let line = self.lines[index];
        let start = char_col(line, name_offset);
        let selection = Range::on_line(index as u32, start, start + name.chars().count() as u32);
        let range = Range::new(Position::new(index as u32, 0), self.line_end(index));

        self.nodes.push(Node {
            symbol: Symbol::new(name, kind, detail, range, selection),
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn line_end(&self, index: usize) -> Position {
        let length = self
            .lines
            .get(index)
            .map(|line| line.chars().count())
            .unwrap_or(0);
        Position::new(index as u32, length as u32)
    }

    /// Children always have larger indices than their parent, so assembling
    /// from the back needs no recursion
    fn assemble(&mut self) -> Vec<Symbol> {
        let mut built: Vec<Option<Symbol>> = Vec::with_capacity(self.nodes.len());
        built.resize_with(self.nodes.len(), || None);

        for index in (0..self.nodes.len()).rev() {
            let children = self.nodes[index]
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            let mut symbol = self.nodes[index].symbol.clone();
            symbol.children = children;
            built[index] = Some(symbol);
        }

        self.roots
            .iter()
            .filter_map(|&root| built[root].take())
            .collect()
    }
}

/// `IComparable(Of T)` -> `IComparable`
pub fn base_type_name(name: &str) -> &str {
    name.split('(').next().unwrap_or(name).trim()
}
