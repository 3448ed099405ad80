//! Check command implementation

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::commands::diagnostics::DiagnosticFilterArgs;
use crate::cli::response::{CheckResponse, DiagnosticsResponse};
use crate::models::diagnostic::DiagnosticSeverity;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub filter: DiagnosticFilterArgs,
}

pub async fn execute(args: CheckArgs, app: &App) -> Result<()> {
    let ctx = &app.output;

    match app.analysis.check_workspace().await {
        Ok(reports) => {
            let mut errors = 0;
            let mut warnings = 0;
            let mut files = Vec::new();

            for report in reports {
                let diagnostics = args.filter.apply(report.diagnostics);
                if diagnostics.is_empty() {
                    continue;
                }
                for diagnostic in &diagnostics {
                    match diagnostic.severity {
                        DiagnosticSeverity::Error => errors += 1,
                        DiagnosticSeverity::Warning => warnings += 1,
                        _ => {}
                    }
                }
                files.push(DiagnosticsResponse::new(ctx.relative_path(&report.file), &diagnostics));
            }

            ctx.print_success_flat(CheckResponse {
                errors,
                warnings,
                files,
            });
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
