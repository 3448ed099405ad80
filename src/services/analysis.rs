//! Analysis service: symbol, diagnostic and navigation queries over files
//!
//! Every call reloads the workspace and rebuilds trees from scratch; the other
//! workspace documents are supplied as siblings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::analysis::{
    Resolved, Validator, build_symbol_tree, implementations_of, parent_of, resolve_at,
};
use crate::error::{SimpleVbError, SimpleVbResult};
use crate::models::diagnostic::Diagnostic;
use crate::models::document::{SiblingTree, TextDocument, uri_to_path};
use crate::models::position::Position;
use crate::models::symbol::{Location, Symbol, SymbolKind};
use crate::services::workspace::{WorkspaceService, build_trees, siblings_of};

/// A resolved symbol and where it lives
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolLocation {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub location: Location,
}

impl From<Resolved<'_>> for SymbolLocation {
    fn from(resolved: Resolved<'_>) -> Self {
        Self {
            name: resolved.symbol.name.clone(),
            kind: resolved.symbol.kind,
            detail: resolved.symbol.detail.clone(),
            location: Location::from_range(uri_to_path(resolved.uri), &resolved.symbol.selection_range),
        }
    }
}

/// Diagnostics for one workspace file
#[derive(Debug, Clone, Serialize)]
pub struct FileDiagnostics {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn symbols(&self, path: &Path) -> SimpleVbResult<Vec<Symbol>>;

    async fn diagnostics(&self, path: &Path) -> SimpleVbResult<Vec<Diagnostic>>;

    async fn definition(&self, path: &Path, pos: Position) -> SimpleVbResult<Option<SymbolLocation>>;

    /// Types implementing the interface at `pos`, or the matching members when
    /// `pos` is on an interface member
    async fn implementations(&self, path: &Path, pos: Position) -> SimpleVbResult<Vec<SymbolLocation>>;

    /// Validate every workspace file; files without diagnostics are omitted
    async fn check_workspace(&self) -> SimpleVbResult<Vec<FileDiagnostics>>;
}

pub struct DefaultAnalysisService {
    workspace: Arc<dyn WorkspaceService>,
    validator: Validator,
}

/// One document with its tree and the trees of every other workspace document
struct Context {
    document: TextDocument,
    tree: Vec<Symbol>,
    siblings: Vec<SiblingTree>,
}

impl DefaultAnalysisService {
    pub fn new(workspace: Arc<dyn WorkspaceService>, validator: Validator) -> Self {
        Self {
            workspace,
            validator,
        }
    }

    async fn context(&self, path: &Path) -> SimpleVbResult<Context> {
        let document = self.workspace.load(path).await?;
        let others = self.workspace.load_all().await;
        let siblings = siblings_of(&build_trees(&others), &document.uri);
        let tree = build_symbol_tree(&document.text);
        tracing::debug!(
            "Analyzing {} with {} sibling documents",
            document.uri,
            siblings.len()
        );
        Ok(Context {
            document,
            tree,
            siblings,
        })
    }

    fn check_position(document: &TextDocument, pos: Position) -> SimpleVbResult<()> {
        if (pos.line as usize) < document.line_count() {
            return Ok(());
        }
        let (line, column) = pos.to_display();
        Err(SimpleVbError::InvalidPosition {
            path: document.path(),
            line,
            column,
        })
    }
}

#[async_trait]
impl AnalysisService for DefaultAnalysisService {
    async fn symbols(&self, path: &Path) -> SimpleVbResult<Vec<Symbol>> {
        let document = self.workspace.load(path).await?;
        Ok(build_symbol_tree(&document.text))
    }

    async fn diagnostics(&self, path: &Path) -> SimpleVbResult<Vec<Diagnostic>> {
        let context = self.context(path).await?;
        Ok(self.validator.validate(&context.document.text, &context.siblings))
    }

    async fn definition(&self, path: &Path, pos: Position) -> SimpleVbResult<Option<SymbolLocation>> {
        let context = self.context(path).await?;
        Self::check_position(&context.document, pos)?;
        Ok(resolve_at(&context.document, &context.tree, &context.siblings, pos).map(SymbolLocation::from))
    }

    async fn implementations(&self, path: &Path, pos: Position) -> SimpleVbResult<Vec<SymbolLocation>> {
        let Context {
            document,
            tree,
            siblings,
        } = self.context(path).await?;
        Self::check_position(&document, pos)?;

        let mut trees = Vec::with_capacity(siblings.len() + 1);
        trees.push(SiblingTree::new(document.uri.clone(), tree));
        trees.extend(siblings);

        let (local, others) = trees.split_at(1);
        let Some(target) = resolve_at(&document, &local[0].symbols, others, pos) else {
            return Ok(Vec::new());
        };

        if target.symbol.kind == SymbolKind::Interface {
            return Ok(implementations_of(&trees, &target.symbol.name)
                .into_iter()
                .map(SymbolLocation::from)
                .collect());
        }

        // Interface member: the same-named member of each implementing type
        let owner = trees
            .iter()
            .find(|tree| tree.uri == target.uri)
            .and_then(|tree| parent_of(&tree.symbols, target.symbol))
            .filter(|parent| parent.kind == SymbolKind::Interface);
        let Some(interface) = owner else {
            return Ok(Vec::new());
        };

        Ok(implementations_of(&trees, &interface.name)
            .into_iter()
            .flat_map(move |implementor| {
                Symbol::flatten(&implementor.symbol.children)
                    .into_iter()
                    .filter(move |member| {
                        member.kind == target.symbol.kind && member.is_named(&target.symbol.name)
                    })
                    .map(move |symbol| {
                        SymbolLocation::from(Resolved {
                            uri: implementor.uri,
                            symbol,
                        })
                    })
            })
            .collect())
    }

    async fn check_workspace(&self) -> SimpleVbResult<Vec<FileDiagnostics>> {
        let documents = self.workspace.load_all().await;
        let trees = build_trees(&documents);

        let mut reports = Vec::new();
        for document in &documents {
            let siblings = siblings_of(&trees, &document.uri);
            let diagnostics = self.validator.validate(&document.text, &siblings);
            if !diagnostics.is_empty() {
                reports.push(FileDiagnostics {
                    file: document.path(),
                    diagnostics,
                });
            }
        }
        tracing::debug!(
            "Checked {} documents, {} with diagnostics",
            documents.len(),
            reports.len()
        );
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::codes;
    use crate::config::RuntimeConfig;
    use crate::models::config::SimpleVbConfig;
    use crate::services::workspace::DefaultWorkspaceService;
    use std::fs;
    use tempfile::TempDir;

    const SHAPES: &str = "\
Public Interface IShape
    Function Area() As Double
    Sub Draw()
End Interface
";

    const CIRCLE: &str = "\
Public Class Circle
    Implements IShape

    Public Function Area() As Double
        Return Radius * Radius
    End Function

    Public Sub Draw()
    End Sub
End Class
";

    const SQUARE: &str = "\
Public Class Square
    Implements IShape

    Public Function Area() As Double
        Return Side * Side
    End Function
End Class
";

    fn setup() -> (TempDir, PathBuf, DefaultAnalysisService) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        fs::write(root.join("Shapes.vb"), SHAPES).unwrap();
        fs::write(root.join("Circle.vb"), CIRCLE).unwrap();
        fs::write(root.join("Square.vb"), SQUARE).unwrap();

        let config = SimpleVbConfig::default();
        let workspace = Arc::new(DefaultWorkspaceService::new(
            &root,
            &config.workspace,
            &RuntimeConfig::from(&config),
        ));
        let service = DefaultAnalysisService::new(workspace, Validator::default());
        (temp, root, service)
    }

    #[tokio::test]
    async fn test_symbols() {
        let (_temp, root, service) = setup();
        let symbols = service.symbols(&root.join("Shapes.vb")).await.unwrap();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "IShape");
        assert_eq!(symbols[0].children.len(), 2);
    }

    #[tokio::test]
    async fn test_diagnostics_use_siblings() {
        let (_temp, root, service) = setup();
        let diagnostics = service.diagnostics(&root.join("Square.vb")).await.unwrap();
        let missing: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.code() == Some(codes::MISSING_MEMBER))
            .collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].data.as_ref().unwrap()["missingMember"], "Draw");
    }

    #[tokio::test]
    async fn test_definition_across_files() {
        let (_temp, root, service) = setup();
        // "IShape" on the Implements line
        let found = service
            .definition(&root.join("Circle.vb"), Position::new(1, 16))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "IShape");
        assert_eq!(found.kind, SymbolKind::Interface);
        assert!(found.location.file.ends_with("Shapes.vb"));
        assert_eq!(found.location.line, 1);
    }

    #[tokio::test]
    async fn test_definition_rejects_bad_position() {
        let (_temp, root, service) = setup();
        let err = service
            .definition(&root.join("Shapes.vb"), Position::new(99, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SimpleVbError::InvalidPosition { line: 100, .. }));
    }

    #[tokio::test]
    async fn test_implementations_of_interface() {
        let (_temp, root, service) = setup();
        let found = service
            .implementations(&root.join("Shapes.vb"), Position::new(0, 20))
            .await
            .unwrap();
        let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Circle", "Square"]);
    }

    #[tokio::test]
    async fn test_implementations_of_member() {
        let (_temp, root, service) = setup();
        // "Draw" inside the interface
        let found = service
            .implementations(&root.join("Shapes.vb"), Position::new(2, 9))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Draw");
        assert!(found[0].location.file.ends_with("Circle.vb"));
    }

    #[tokio::test]
    async fn test_check_workspace() {
        let (_temp, _root, service) = setup();
        let reports = service.check_workspace().await.unwrap();
        let square = reports
            .iter()
            .find(|report| report.file.ends_with("Square.vb"))
            .unwrap();
        assert!(square
            .diagnostics
            .iter()
            .any(|d| d.code() == Some(codes::MISSING_MEMBER)));
        assert!(!reports.iter().any(|report| report
            .diagnostics
            .iter()
            .any(|d| d.code() == Some(codes::DUPLICATE_DECLARATION))));
    }
}
