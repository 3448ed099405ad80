//! Data models for SimpleVB
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod diagnostic;
pub mod document;
pub mod position;
pub mod symbol;

// Re-export commonly used types
pub use config::SimpleVbConfig;
pub use diagnostic::{Diagnostic, DiagnosticSeverity, DiagnosticTag};
pub use document::{SiblingTree, TextDocument};
pub use position::{Position, Range};
pub use symbol::{Location, Symbol, SymbolKind};
