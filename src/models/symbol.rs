//! Symbol model definitions
//!
//! Core types for the per-document symbol tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::position::Range;

pub const ARGUMENT_DETAIL_PREFIX: &str = "Argument ";
pub const IMPLEMENTS_DETAIL_PREFIX: &str = "Implements ";

/// One node of a document's symbol tree
///
/// Children are kept in source order. There is no parent pointer; parentage is
/// recovered with `analysis::resolver::parent_of`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub detail: String,
    pub range: Range,
    pub selection_range: Range,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Symbol>,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        detail: impl Into<String>,
        range: Range,
        selection_range: Range,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            detail: detail.into(),
            range,
            selection_range,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Symbol>) -> Self {
        self.children = children;
        self
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn is_argument(&self) -> bool {
        self.detail.starts_with(ARGUMENT_DETAIL_PREFIX)
    }

    /// `Implements X` marker child of a class
    pub fn is_implements(&self) -> bool {
        self.kind == SymbolKind::Interface && self.detail.starts_with(IMPLEMENTS_DETAIL_PREFIX)
    }

    /// A declaration that can be the target of navigation from another file
    pub fn is_definition(&self) -> bool {
        self.kind.is_definition() && !self.is_implements()
    }

    /// Local `Dim`/`Static` declared inside a method body
    pub fn is_local_variable(&self) -> bool {
        self.kind == SymbolKind::Variable && !self.is_argument()
    }

    /// Depth-first, pre-order list of every symbol in the forest
    pub fn flatten(symbols: &[Symbol]) -> Vec<&Symbol> {
        let mut out = Vec::new();
        Self::collect_flat(symbols, &mut out);
        out
    }

    fn collect_flat<'a>(symbols: &'a [Symbol], out: &mut Vec<&'a Symbol>) {
        for symbol in symbols {
            out.push(symbol);
            Self::collect_flat(&symbol.children, out);
        }
    }

    /// Keep symbols whose kind is in `kinds`, lifting matching descendants of
    /// excluded parents
    pub fn filter_by_kind(symbols: &[Symbol], kinds: &[SymbolKind]) -> Vec<Symbol> {
        let mut results = Vec::new();
        for symbol in symbols {
            let children = Self::filter_by_kind(&symbol.children, kinds);
            if kinds.contains(&symbol.kind) {
                results.push(symbol.clone().with_children(children));
            } else {
                results.extend(children);
            }
        }
        results
    }

    /// Check if symbol name contains substring (case-insensitive)
    pub fn matches_substring(&self, substring: &str) -> bool {
        self.name.to_lowercase().contains(&substring.to_lowercase())
    }
}

/// Symbol classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Method,
    Function,
    Class,
    Module,
    Property,
    Interface,
    Enum,
    Structure,
    Variable,
    Constant,
    Field,
    /// `Imports` lines
    Package,
    /// `Namespace` blocks and `#Region` markers
    Namespace,
    EnumMember,
}

impl SymbolKind {
    /// Convert to LSP SymbolKind number
    pub fn to_lsp(&self) -> u32 {
        match self {
            Self::Module => 2,
            Self::Namespace => 3,
            Self::Package => 4,
            Self::Class => 5,
            Self::Method => 6,
            Self::Property => 7,
            Self::Field => 8,
            Self::Enum => 10,
            Self::Interface => 11,
            Self::Function => 12,
            Self::Variable => 13,
            Self::Constant => 14,
            Self::EnumMember => 22,
            Self::Structure => 23,
        }
    }

    /// Kinds that `lookup_global` and duplicate detection consider
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            Self::Class
                | Self::Module
                | Self::Interface
                | Self::Enum
                | Self::Structure
                | Self::Method
                | Self::Function
        )
    }

    /// Kinds that own local variables
    pub fn is_method_like(&self) -> bool {
        matches!(self, Self::Method | Self::Function | Self::Property)
    }

    /// Types that may carry fields and `Implements` clauses
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Self::Class | Self::Module | Self::Structure | Self::Interface | Self::Enum
        )
    }

    /// Grouping symbols that lookups see through
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Namespace)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Method => "method",
            Self::Function => "function",
            Self::Class => "class",
            Self::Module => "module",
            Self::Property => "property",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Structure => "structure",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Field => "field",
            Self::Package => "package",
            Self::Namespace => "namespace",
            Self::EnumMember => "enum_member",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "method" | "sub" => Ok(Self::Method),
            "function" => Ok(Self::Function),
            "class" => Ok(Self::Class),
            "module" => Ok(Self::Module),
            "property" => Ok(Self::Property),
            "interface" => Ok(Self::Interface),
            "enum" => Ok(Self::Enum),
            "structure" | "struct" => Ok(Self::Structure),
            "variable" => Ok(Self::Variable),
            "constant" | "const" => Ok(Self::Constant),
            "field" => Ok(Self::Field),
            "package" | "imports" => Ok(Self::Package),
            "namespace" | "region" => Ok(Self::Namespace),
            "enum_member" | "enummember" => Ok(Self::EnumMember),
            _ => Err(format!(
                "Unknown symbol kind: '{}'. Valid: {}",
                s,
                Self::all_kind_names().join(", ")
            )),
        }
    }
}

impl SymbolKind {
    /// All valid kind names for error messages
    pub fn all_kind_names() -> &'static [&'static str] {
        &[
            "method",
            "function",
            "class",
            "module",
            "property",
            "interface",
            "enum",
            "structure",
            "variable",
            "constant",
            "field",
            "package",
            "namespace",
            "enum_member",
        ]
    }
}

/// Source code location in a workspace file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path
    pub file: PathBuf,

    /// Start line (1-indexed)
    pub line: u32,

    /// Start column (1-indexed)
    pub column: u32,

    /// End line (1-indexed, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    /// End column (1-indexed, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl Location {
    /// Location of a range given in 0-indexed coordinates
    pub fn from_range(file: PathBuf, range: &Range) -> Self {
        Self {
            file,
            line: range.start.line + 1,
            column: range.start.character + 1,
            end_line: Some(range.end.line + 1),
            end_column: Some(range.end.character + 1),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}
