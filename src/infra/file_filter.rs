//! Workspace file discovery with .gitignore integration
//!
//! Uses the `ignore` crate (from ripgrep) for gitignore-style matching. Paths
//! are filtered by `.gitignore`, `.simplevb/ignore` and the configured
//! directory names, in that order of precedence from lowest to highest.

use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::models::config::WorkspaceConfig;

/// Directory holding project config and the ignore file
pub const PROJECT_DIR: &str = ".simplevb";

/// Always skipped, regardless of configuration
const ALWAYS_IGNORED: &[&str] = &[".git", ".svn", ".hg", ".vs", ".idea", ".vscode"];

#[derive(Debug, Clone)]
pub struct FileFilterConfig {
    pub root: PathBuf,
    pub respect_gitignore: bool,
    /// Directory or file names skipped anywhere in the tree
    pub ignored_names: Vec<String>,
    /// Extensions (without dot) that count as source files
    pub extensions: Vec<String>,
}

impl FileFilterConfig {
    pub fn from_workspace(root: impl Into<PathBuf>, workspace: &WorkspaceConfig) -> Self {
        Self {
            root: root.into(),
            respect_gitignore: true,
            ignored_names: workspace.ignored_paths.clone(),
            extensions: workspace.extensions.clone(),
        }
    }
}

pub struct FileFilter {
    config: FileFilterConfig,
    gitignore: Option<Gitignore>,
    project_ignore: Option<Gitignore>,
}

impl FileFilter {
    pub fn new(config: FileFilterConfig) -> Self {
        let gitignore = if config.respect_gitignore {
            Self::load_ignore_file(&config.root, &config.root.join(".gitignore"))
        } else {
            None
        };
        let project_ignore =
            Self::load_ignore_file(&config.root, &config.root.join(PROJECT_DIR).join("ignore"));

        Self {
            config,
            gitignore,
            project_ignore,
        }
    }

    pub fn for_workspace(root: impl Into<PathBuf>, workspace: &WorkspaceConfig) -> Self {
        Self::new(FileFilterConfig::from_workspace(root, workspace))
    }

    fn load_ignore_file(root: &Path, path: &Path) -> Option<Gitignore> {
        if !path.exists() {
            return None;
        }
        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(path) {
            tracing::warn!("Failed to parse {}: {}", path.display(), err);
        }
        builder.build().ok()
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn extensions(&self) -> &[String] {
        &self.config.extensions
    }

    /// Extension matches one of the configured source extensions (any case)
    pub fn is_source_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }

    /// Paths outside the root are never ignored
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.config.root) else {
            return false;
        };
        let is_dir = path.is_dir();

        let named_ignored = relative.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|name| {
                ALWAYS_IGNORED.contains(&name)
                    || self
                        .config
                        .ignored_names
                        .iter()
                        .any(|ignored| ignored.eq_ignore_ascii_case(name))
            }),
            _ => false,
        });
        if named_ignored {
            return true;
        }

        for ignore in [&self.project_ignore, &self.gitignore].into_iter().flatten() {
            match ignore.matched_path_or_any_parents(relative, is_dir) {
                ignore::Match::Ignore(_) => return true,
                ignore::Match::Whitelist(_) => return false,
                ignore::Match::None => {}
            }
        }
        false
    }

    pub fn should_include(&self, path: &Path) -> bool {
        !self.is_ignored(path)
    }

    fn walk_builder(&self) -> WalkBuilder {
        let mut builder = WalkBuilder::new(&self.config.root);
        builder
            .hidden(true)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .require_git(false);
        builder
    }

    /// Source files under the root, sorted for stable sibling order
    pub fn discover_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .walk_builder()
            .build()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && self.is_source_file(path) && self.should_include(path))
            .collect();
        files.sort();
        tracing::debug!("Discovered {} source files under {}", files.len(), self.config.root.display());
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn filter_for(root: &Path) -> FileFilter {
        FileFilter::for_workspace(root, &WorkspaceConfig::default())
    }

    #[test]
    fn test_gitignore_integration() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join(".gitignore"), "Generated/\n*.g.vb\n").unwrap();
        fs::write(root.join("Module1.vb"), "Module Module1\nEnd Module").unwrap();
        fs::write(root.join("Form.g.vb"), "").unwrap();
        fs::create_dir(root.join("Generated")).unwrap();
        fs::write(root.join("Generated/Proxy.vb"), "").unwrap();

        let filter = filter_for(root);
        assert!(filter.should_include(&root.join("Module1.vb")));
        assert!(!filter.should_include(&root.join("Form.g.vb")));
        assert!(!filter.should_include(&root.join("Generated/Proxy.vb")));
    }

    #[test]
    fn test_project_ignore_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join(PROJECT_DIR)).unwrap();
        fs::write(root.join(PROJECT_DIR).join("ignore"), "Legacy*.vb\n").unwrap();
        fs::write(root.join("Main.vb"), "").unwrap();
        fs::write(root.join("LegacyForm.vb"), "").unwrap();

        let filter = filter_for(root);
        assert!(filter.should_include(&root.join("Main.vb")));
        assert!(!filter.should_include(&root.join("LegacyForm.vb")));
    }

    #[test]
    fn test_discover_files_by_extension() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("bin/Debug")).unwrap();
        fs::write(root.join("src/B.vb"), "").unwrap();
        fs::write(root.join("src/A.VB"), "").unwrap();
        fs::write(root.join("src/notes.txt"), "").unwrap();
        fs::write(root.join("bin/Debug/Copy.vb"), "").unwrap();

        let files = filter_for(root).discover_files();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/A.VB", "src/B.vb"]);
    }
}
