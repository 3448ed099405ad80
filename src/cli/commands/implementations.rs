//! Implementations command implementation

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::{ImplementationsResponse, SymbolRefOutput};

#[derive(Args, Debug)]
pub struct ImplementationsArgs {
    /// File path with position (file:line:column) on an interface or one of its members
    pub location: String,

    /// Maximum results
    #[arg(long)]
    pub limit: Option<usize>,
}

pub async fn execute(args: ImplementationsArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let loc = ParsedLocation::parse(&args.location)?.resolve_in(app.root())?;

    match app.analysis.implementations(&loc.file, loc.position()).await {
        Ok(found) => {
            let implementations: Vec<_> = found
                .iter()
                .take(args.limit.unwrap_or(usize::MAX))
                .map(|f| SymbolRefOutput::from_resolved(f, ctx.root()))
                .collect();
            ctx.print_success_flat(ImplementationsResponse {
                count: implementations.len(),
                implementations,
            });
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
