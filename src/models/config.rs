//! Configuration model for SimpleVB
//!
//! Loaded from `~/.config/simplevb/config.toml` and `.simplevb/config.toml`.

use serde::{Deserialize, Serialize};

/// SimpleVB configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimpleVbConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Workspace discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Source file extensions (without dot)
    #[serde(default = "defaults::extensions")]
    pub extensions: Vec<String>,

    /// Additional paths to ignore (gitignore syntax)
    #[serde(default = "default_ignored_paths")]
    pub ignored_paths: Vec<String>,

    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u32,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            extensions: defaults::extensions(),
            ignored_paths: default_ignored_paths(),
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

impl WorkspaceConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        if self.max_file_size_mb == 0 {
            u64::MAX
        } else {
            self.max_file_size_mb as u64 * 1024 * 1024
        }
    }
}

fn default_ignored_paths() -> Vec<String> {
    vec![
        "bin".to_string(),
        "obj".to_string(),
        "packages".to_string(),
        ".vs".to_string(),
        ".simplevb".to_string(),
    ]
}

/// Validator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "defaults::max_line_length")]
    pub max_line_length: usize,

    /// Diagnostic codes to suppress (e.g. "magic-number")
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_line_length: defaults::max_line_length(),
            disabled: Vec::new(),
        }
    }
}

/// Background diagnostics scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// How often `watch` rescans the workspace
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::debounce_ms(),
            poll_interval_ms: defaults::poll_interval_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// "json" (pretty) or "compact"
    #[serde(default = "defaults::format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: defaults::format(),
        }
    }
}

mod defaults {
    // Workspace
    pub fn extensions() -> Vec<String> {
        vec!["vb".to_string()]
    }
    pub fn max_file_size_mb() -> u32 {
        2
    }

    // Validation
    pub fn max_line_length() -> usize {
        120
    }

    // Diagnostics
    pub fn debounce_ms() -> u64 {
        300
    }
    pub fn poll_interval_ms() -> u64 {
        500
    }

    // Output
    pub fn format() -> String {
        "json".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimpleVbConfig::default();
        assert_eq!(config.workspace.extensions, vec!["vb".to_string()]);
        assert_eq!(config.validation.max_line_length, 120);
        assert!(config.validation.disabled.is_empty());
        assert_eq!(config.diagnostics.debounce_ms, 300);
        assert_eq!(config.output.format, "json");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SimpleVbConfig = toml::from_str(
            r#"
            [validation]
            disabled = ["magic-number"]
            "#,
        )
        .unwrap();
        assert_eq!(config.validation.disabled, vec!["magic-number".to_string()]);
        assert_eq!(config.validation.max_line_length, 120);
        assert_eq!(config.workspace.max_file_size_mb, 2);
    }

    #[test]
    fn test_max_file_size_unlimited() {
        let workspace = WorkspaceConfig {
            max_file_size_mb: 0,
            ..Default::default()
        };
        assert_eq!(workspace.max_file_size_bytes(), u64::MAX);
        assert_eq!(WorkspaceConfig::default().max_file_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_ignored_paths() {
        let config = SimpleVbConfig::default();
        assert!(config.workspace.ignored_paths.contains(&"obj".to_string()));
        assert!(config.workspace.ignored_paths.contains(&".simplevb".to_string()));
    }
}
