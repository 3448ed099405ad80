//! CLI module for SimpleVB
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod location;
pub mod output;
pub mod response;

pub use location::ParsedLocation;
pub use output::{OutputContext, OutputFormat};

use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, config::ConfigArgs, definition::DefinitionArgs,
    diagnostics::DiagnosticsArgs, implementations::ImplementationsArgs, symbols::SymbolsArgs,
    watch::WatchArgs,
};

const LONG_ABOUT: &str = r#"
SimpleVB - structural analysis for Visual Basic .NET sources

Builds symbol outlines, resolves names across the workspace and validates
block structure without a full parser. All output is JSON.

QUICK START:
  simplevb symbols src/Module1.vb              # Document outline
  simplevb diagnostics src/Module1.vb          # Validate one file
  simplevb check                               # Validate the workspace
  simplevb definition src/Module1.vb:12:9      # Go to definition
  simplevb implementations src/IShape.vb:1:18  # Types implementing an interface
  simplevb watch                               # Stream diagnostics as files change

Logging goes to stderr; set RUST_LOG=simplevb=debug for details.
"#;

/// SimpleVB - structural analysis for Visual Basic .NET sources
#[derive(Parser, Debug)]
#[command(name = "simplevb")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'simplevb <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, compact); overrides output.format
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the symbols of a file
    Symbols(SymbolsArgs),

    /// Validate a file
    Diagnostics(DiagnosticsArgs),

    /// Validate every source file in the workspace
    Check(CheckArgs),

    /// Go to the definition of the name at a position
    Definition(DefinitionArgs),

    /// Find types implementing the interface at a position
    Implementations(ImplementationsArgs),

    /// Stream diagnostics while files change (Ctrl-C to stop)
    Watch(WatchArgs),

    /// Configuration management
    Config(ConfigArgs),
}
