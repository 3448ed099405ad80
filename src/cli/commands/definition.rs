//! Definition command implementation

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::{DefinitionResponse, SymbolRefOutput};

#[derive(Args, Debug)]
pub struct DefinitionArgs {
    /// File path with position (file:line:column)
    pub location: String,
}

pub async fn execute(args: DefinitionArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let loc = ParsedLocation::parse(&args.location)?.resolve_in(app.root())?;

    match app.analysis.definition(&loc.file, loc.position()).await {
        Ok(Some(found)) => {
            ctx.print_success_flat(DefinitionResponse {
                definition: Some(SymbolRefOutput::from_resolved(&found, ctx.root())),
                message: None,
            });
        }
        Ok(None) => {
            ctx.print_success_flat(DefinitionResponse {
                definition: None,
                message: Some("No definition found".to_string()),
            });
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
