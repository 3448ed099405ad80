//! Diagnostics command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::response::DiagnosticsResponse;
use crate::models::diagnostic::{Diagnostic, DiagnosticSeverity};

#[derive(Args, Debug)]
pub struct DiagnosticsArgs {
    /// File path to check
    pub file: PathBuf,

    #[command(flatten)]
    pub filter: DiagnosticFilterArgs,
}

/// Filters shared by `diagnostics` and `check`
#[derive(Args, Debug, Default)]
pub struct DiagnosticFilterArgs {
    /// Filter by severity (error, warning, info, hint)
    #[arg(long, short = 's', value_delimiter = ',')]
    pub severity: Option<Vec<DiagnosticSeverity>>,

    /// Filter by diagnostic code (e.g. unused-variable,magic-number)
    #[arg(long, value_delimiter = ',')]
    pub code: Option<Vec<String>>,
}

impl DiagnosticFilterArgs {
    pub fn matches(&self, diagnostic: &Diagnostic) -> bool {
        if let Some(severities) = &self.severity
            && !severities.contains(&diagnostic.severity)
        {
            return false;
        }
        if let Some(codes) = &self.code
            && !diagnostic
                .code()
                .is_some_and(|code| codes.iter().any(|c| c.eq_ignore_ascii_case(code)))
        {
            return false;
        }
        true
    }

    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics.into_iter().filter(|d| self.matches(d)).collect()
    }
}

pub async fn execute(args: DiagnosticsArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let path = app.root().join(&args.file);

    match app.analysis.diagnostics(&path).await {
        Ok(diagnostics) => {
            let filtered = args.filter.apply(diagnostics);
            ctx.print_success_flat(DiagnosticsResponse::new(ctx.relative_path(&path), &filtered));
        }
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::position::Range;

    fn sample() -> Vec<Diagnostic> {
        vec![
            Diagnostic::error(Range::on_line(0, 0, 1), "a").with_code("missing-then"),
            Diagnostic::warning(Range::on_line(1, 0, 1), "b").with_code("untyped-variable"),
            Diagnostic::info(Range::on_line(2, 0, 1), "c").with_code("magic-number"),
        ]
    }

    #[test]
    fn test_no_filter_keeps_everything() {
        assert_eq!(DiagnosticFilterArgs::default().apply(sample()).len(), 3);
    }

    #[test]
    fn test_severity_filter() {
        let filter = DiagnosticFilterArgs {
            severity: Some(vec![DiagnosticSeverity::Error, DiagnosticSeverity::Warning]),
            code: None,
        };
        let kept: Vec<_> = filter.apply(sample()).into_iter().map(|d| d.message).collect();
        assert_eq!(kept, vec!["a", "b"]);
    }

    #[test]
    fn test_code_filter() {
        let filter = DiagnosticFilterArgs {
            severity: None,
            code: Some(vec!["MAGIC-NUMBER".to_string()]),
        };
        let kept = filter.apply(sample());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].message, "c");
    }
}
