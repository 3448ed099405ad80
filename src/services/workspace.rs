//! Workspace service: source discovery and document loading

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::analysis::build_symbol_tree;
use crate::config::RuntimeConfig;
use crate::error::WorkspaceError;
use crate::infra::file_filter::FileFilter;
use crate::models::config::WorkspaceConfig;
use crate::models::document::{SiblingTree, TextDocument};

#[async_trait]
pub trait WorkspaceService: Send + Sync {
    fn root(&self) -> &Path;

    /// Source files under the root, sorted
    async fn discover(&self) -> Vec<PathBuf>;

    /// Read one source file, enforcing the size limit
    async fn load(&self, path: &Path) -> Result<TextDocument, WorkspaceError>;

    /// Every discovered document; unreadable files are logged and skipped
    async fn load_all(&self) -> Vec<TextDocument>;
}

pub struct DefaultWorkspaceService {
    root: PathBuf,
    filter: Arc<FileFilter>,
    max_file_size_bytes: u64,
    max_file_size_mb: u64,
}

impl DefaultWorkspaceService {
    pub fn new(root: &Path, workspace: &WorkspaceConfig, runtime: &RuntimeConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            filter: Arc::new(FileFilter::for_workspace(root, workspace)),
            max_file_size_bytes: runtime.max_file_size_bytes,
            max_file_size_mb: runtime.max_file_size_mb(),
        }
    }

    /// `.vb, .vbs` style list for error messages
    fn expected_extensions(&self) -> String {
        self.filter
            .extensions()
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait]
impl WorkspaceService for DefaultWorkspaceService {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn discover(&self) -> Vec<PathBuf> {
        let filter = Arc::clone(&self.filter);
        match tokio::task::spawn_blocking(move || filter.discover_files()).await {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Workspace scan failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn load(&self, path: &Path) -> Result<TextDocument, WorkspaceError> {
        let path = match tokio::fs::canonicalize(path).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WorkspaceError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        if !self.filter.is_source_file(&path) {
            return Err(WorkspaceError::UnsupportedFile {
                expected: self.expected_extensions(),
                path,
            });
        }

        let size = tokio::fs::metadata(&path).await?.len();
        if size > self.max_file_size_bytes {
            return Err(WorkspaceError::FileTooLarge {
                path,
                size_mb: size / (1024 * 1024),
                limit_mb: self.max_file_size_mb,
            });
        }

        let bytes = tokio::fs::read(&path).await?;
        let text = String::from_utf8(bytes).map_err(|_| WorkspaceError::NotUtf8(path.clone()))?;
        Ok(TextDocument::from_path(&path, text))
    }

    async fn load_all(&self) -> Vec<TextDocument> {
        let files = self.discover().await;
        let loaded = join_all(files.iter().map(|path| self.load(path))).await;

        loaded
            .into_iter()
            .zip(&files)
            .filter_map(|(result, path)| match result {
                Ok(document) => Some(document),
                Err(e) if e.is_skippable() => {
                    tracing::debug!("Skipping {}: {}", path.display(), e);
                    None
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }
}

/// Symbol tree of each document, in the order given
pub fn build_trees(documents: &[TextDocument]) -> Vec<SiblingTree> {
    documents
        .iter()
        .map(|document| SiblingTree::new(document.uri.clone(), build_symbol_tree(&document.text)))
        .collect()
}

/// Every tree except the one for `uri`, in the order given
pub fn siblings_of(trees: &[SiblingTree], uri: &str) -> Vec<SiblingTree> {
    trees.iter().filter(|tree| tree.uri != uri).cloned().collect()
}
