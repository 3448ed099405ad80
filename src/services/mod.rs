//! Service layer for SimpleVB

pub mod analysis;
pub mod config;
pub mod publisher;
pub mod workspace;

pub use analysis::{AnalysisService, DefaultAnalysisService, FileDiagnostics, SymbolLocation};
pub use config::{ConfigService, DefaultConfigService};
pub use publisher::{DiagnosticsPublisher, PublishDiagnostics};
pub use workspace::{DefaultWorkspaceService, WorkspaceService, build_trees, siblings_of};
