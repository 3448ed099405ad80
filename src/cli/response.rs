//! Response types for CLI output
//!
//! All types implement Serialize for consistent JSON output. Positions are
//! 1-indexed and paths relative to the project root where possible.

use std::path::Path;

use serde::Serialize;

use crate::models::diagnostic::Diagnostic;
use crate::models::symbol::{Location, Symbol};
use crate::services::analysis::SymbolLocation;

/// Location in a file (relative path by default)
#[derive(Debug, Clone, Serialize)]
pub struct LocationOutput {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl LocationOutput {
    /// Create from absolute path, converting to relative if within root
    pub fn from_path(path: &Path, line: u32, column: u32, root: &Path) -> Self {
        let file = path
            .strip_prefix(root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string());

        Self { file, line, column }
    }

    pub fn from_location(location: &Location, root: &Path) -> Self {
        Self::from_path(&location.file, location.line, location.column, root)
    }
}

/// One node of a document outline
#[derive(Debug, Clone, Serialize)]
pub struct SymbolOutput {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SymbolOutput>>,
}

impl SymbolOutput {
    /// `depth` limits how many levels of children are kept; `None` keeps all
    pub fn from_symbol(symbol: &Symbol, depth: Option<u32>) -> Self {
        let (line, column) = symbol.selection_range.start.to_display();
        let children = match depth {
            Some(0) => None,
            _ if symbol.children.is_empty() => None,
            _ => Some(
                symbol
                    .children
                    .iter()
                    .map(|child| SymbolOutput::from_symbol(child, depth.map(|d| d - 1)))
                    .collect(),
            ),
        };
        Self {
            name: symbol.name.clone(),
            kind: symbol.kind.to_string(),
            detail: symbol.detail.clone(),
            line,
            column,
            end_line: symbol.range.end.line + 1,
            children,
        }
    }
}

/// Response for the symbols command
#[derive(Debug, Serialize)]
pub struct SymbolsResponse {
    pub file: String,
    pub count: usize,
    pub symbols: Vec<SymbolOutput>,
}

/// A navigation target
#[derive(Debug, Clone, Serialize)]
pub struct SymbolRefOutput {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub location: LocationOutput,
}

impl SymbolRefOutput {
    pub fn from_resolved(found: &SymbolLocation, root: &Path) -> Self {
        Self {
            name: found.name.clone(),
            kind: found.kind.to_string(),
            detail: found.detail.clone(),
            location: LocationOutput::from_location(&found.location, root),
        }
    }
}

/// Response for the definition command
#[derive(Debug, Serialize)]
pub struct DefinitionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<SymbolRefOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for the implementations command
#[derive(Debug, Serialize)]
pub struct ImplementationsResponse {
    pub count: usize,
    pub implementations: Vec<SymbolRefOutput>,
}

/// Diagnostic output
#[derive(Debug, Serialize)]
pub struct DiagnosticOutput {
    pub severity: String,
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl From<&Diagnostic> for DiagnosticOutput {
    fn from(d: &Diagnostic) -> Self {
        Self {
            severity: d.severity.to_string(),
            message: d.message.clone(),
            line: d.display_line(),
            column: d.display_column(),
            end_line: d.display_end_line(),
            end_column: d.display_end_column(),
            code: d.code.clone(),
            tags: d.tags.iter().map(|t| t.to_string()).collect(),
            data: d.data.clone(),
        }
    }
}

/// Response for the diagnostics command, and one file of a check
#[derive(Debug, Serialize)]
pub struct DiagnosticsResponse {
    pub file: String,
    pub count: usize,
    pub diagnostics: Vec<DiagnosticOutput>,
}

impl DiagnosticsResponse {
    pub fn new(file: String, diagnostics: &[Diagnostic]) -> Self {
        Self {
            file,
            count: diagnostics.len(),
            diagnostics: diagnostics.iter().map(DiagnosticOutput::from).collect(),
        }
    }
}

/// Response for the check command
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub errors: usize,
    pub warnings: usize,
    pub files: Vec<DiagnosticsResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::build_symbol_tree;
    use crate::models::position::Range;

    #[test]
    fn test_symbol_output_depth() {
        let tree = build_symbol_tree("Class A\n    Sub Run(x As Integer)\n    End Sub\nEnd Class\n");

        let full = SymbolOutput::from_symbol(&tree[0], None);
        let run = &full.children.as_ref().unwrap()[0];
        assert_eq!(run.name, "Run");
        assert_eq!(run.line, 2);
        assert_eq!(run.column, 9);
        assert_eq!(run.end_line, 3);
        assert_eq!(run.children.as_ref().unwrap()[0].name, "x");

        let shallow = SymbolOutput::from_symbol(&tree[0], Some(1));
        let run = &shallow.children.as_ref().unwrap()[0];
        assert!(run.children.is_none());

        assert!(SymbolOutput::from_symbol(&tree[0], Some(0)).children.is_none());
    }

    #[test]
    fn test_diagnostic_output_is_one_based() {
        let diagnostic = Diagnostic::warning(Range::on_line(2, 4, 9), "Too long").with_code("line-too-long");
        let output = DiagnosticOutput::from(&diagnostic);
        assert_eq!(output.severity, "warning");
        assert_eq!((output.line, output.column), (3, 5));
        assert_eq!((output.end_line, output.end_column), (3, 10));
        assert_eq!(output.code.as_deref(), Some("line-too-long"));
    }

    #[test]
    fn test_location_output_relative() {
        let location = Location::from_range("/project/src/A.vb".into(), &Range::on_line(2, 6, 9));
        let output = LocationOutput::from_location(&location, Path::new("/project"));
        assert_eq!(output.file, "src/A.vb");
        assert_eq!((output.line, output.column), (3, 7));
    }
}
