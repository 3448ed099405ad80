//! Symbols command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::response::{SymbolOutput, SymbolsResponse};
use crate::models::symbol::{Symbol, SymbolKind};

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// File path
    pub file: PathBuf,

    /// Keep only these kinds, comma-separated (class,method,field)
    #[arg(long, value_delimiter = ',')]
    pub kind: Option<Vec<String>>,

    /// Keep only symbols whose name contains this text (case-insensitive)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Levels of children to include (0 = top-level only)
    #[arg(short, long)]
    pub depth: Option<u32>,
}

pub async fn execute(args: SymbolsArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let kinds = parse_kinds(args.kind.as_deref())?;
    let path = app.root().join(&args.file);

    match app.analysis.symbols(&path).await {
        Ok(symbols) => {
            let symbols = match &kinds {
                Some(kinds) => Symbol::filter_by_kind(&symbols, kinds),
                None => symbols,
            };
            let output: Vec<SymbolOutput> = match &args.name {
                // Name matches are reported flat
                Some(query) => Symbol::flatten(&symbols)
                    .into_iter()
                    .filter(|s| s.matches_substring(query))
                    .map(|s| SymbolOutput::from_symbol(s, Some(0)))
                    .collect(),
                None => symbols
                    .iter()
                    .map(|s| SymbolOutput::from_symbol(s, args.depth))
                    .collect(),
            };

            ctx.print_success_flat(SymbolsResponse {
                file: ctx.relative_path(&path),
                count: output.len(),
                symbols: output,
            });
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}

/// Parse kind names; unknown names are an error listing the valid ones
pub(crate) fn parse_kinds(kinds: Option<&[String]>) -> Result<Option<Vec<SymbolKind>>> {
    let Some(kinds) = kinds else {
        return Ok(None);
    };

    let mut result = Vec::new();
    for kind in kinds.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        result.push(kind.parse::<SymbolKind>().map_err(anyhow::Error::msg)?);
    }

    Ok((!result.is_empty()).then_some(result))
}
