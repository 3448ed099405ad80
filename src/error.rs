//! Error types for SimpleVB
//!
//! The analysis core is total and never fails; these cover the workspace,
//! configuration and I/O around it.

use std::path::PathBuf;

use thiserror::Error;

pub type SimpleVbResult<T> = std::result::Result<T, SimpleVbError>;

#[derive(Debug, Error)]
pub enum SimpleVbError {
    #[error("{0}")]
    Workspace(#[from] WorkspaceError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Invalid position {line}:{column} in {path}")]
    InvalidPosition {
        path: PathBuf,
        line: u32,
        column: u32,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a source file (expected one of: {expected}): {path}")]
    UnsupportedFile { path: PathBuf, expected: String },

    #[error("File too large ({size_mb}MB > {limit_mb}MB limit): {path}")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error("File is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WorkspaceError {
    /// Errors that only affect a single file during a workspace scan
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. } | Self::NotUtf8(_) | Self::UnsupportedFile { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Config already exists: {0}. Use --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message() {
        let err = WorkspaceError::FileTooLarge {
            path: PathBuf::from("big.vb"),
            size_mb: 5,
            limit_mb: 2,
        };
        assert_eq!(err.to_string(), "File too large (5MB > 2MB limit): big.vb");
        assert!(err.is_skippable());
    }

    #[test]
    fn test_not_found_is_fatal() {
        let err = WorkspaceError::NotFound(PathBuf::from("gone.vb"));
        assert!(!err.is_skippable());
    }

    #[test]
    fn test_errors_convert_into_top_level() {
        let err: SimpleVbError = ConfigError::InvalidValue {
            key: "validation.max_line_length".to_string(),
            message: "must be positive".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invalid value for 'validation.max_line_length': must be positive"
        );

        let err: SimpleVbError = WorkspaceError::NotUtf8(PathBuf::from("a.vb")).into();
        assert!(matches!(err, SimpleVbError::Workspace(_)));
    }
}
