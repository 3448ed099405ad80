//! Output formatting for CLI commands

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

/// How JSON responses are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed
    #[default]
    Json,
    /// One line per response
    Compact,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "pretty" => Ok(Self::Json),
            "compact" | "jsonl" => Ok(Self::Compact),
            _ => Err(format!("Unknown output format: '{}'. Valid: json, compact", s)),
        }
    }
}

/// Output context for consistent formatting across commands
///
/// This is the single source of truth for output formatting.
/// All commands should use this context for output.
#[derive(Debug, Clone)]
pub struct OutputContext {
    /// Project root for relative path calculation
    root: PathBuf,
    format: OutputFormat,
}

impl OutputContext {
    pub fn new(root: PathBuf, format: OutputFormat) -> Self {
        Self { root, format }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Convert an absolute path to relative (if within project root)
    pub fn relative_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| path.display().to_string())
    }

    /// Print a successful response with flat structure (data fields at top level)
    pub fn print_success_flat<T: Serialize>(&self, data: T) {
        let mut response = serde_json::to_value(data).unwrap_or(serde_json::json!({}));
        if let Some(obj) = response.as_object_mut() {
            obj.insert("success".to_string(), serde_json::json!(true));
        }
        self.print_json(&response);
    }

    /// Print an error response
    pub fn print_error(&self, message: &str) {
        let response = serde_json::json!({
            "success": false,
            "error": message
        });
        self.print_json(&response);
    }

    /// Print a streamed event, always on a single line
    pub fn print_event<T: Serialize>(&self, event: T) {
        match serde_json::to_string(&event) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize output: {e}"),
        }
    }

    fn print_json(&self, value: &serde_json::Value) {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value),
            OutputFormat::Compact => serde_json::to_string(value),
        };
        match rendered {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Failed to serialize output: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_path() {
        let ctx = OutputContext::new(PathBuf::from("/project"), OutputFormat::Json);

        assert_eq!(
            ctx.relative_path(Path::new("/project/src/Module1.vb")),
            "src/Module1.vb"
        );

        // Path outside project stays absolute
        assert_eq!(
            ctx.relative_path(Path::new("/other/Form1.vb")),
            "/other/Form1.vb"
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("jsonl".parse::<OutputFormat>(), Ok(OutputFormat::Compact));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
