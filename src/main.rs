//! SimpleVB - structural analysis CLI for Visual Basic .NET sources
//!
//! Symbol outlines, navigation and validation without a full parser.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use simplevb::app::App;
use simplevb::cli::{Cli, Commands};

fn main() {
    // Quiet by default so stdout stays machine-readable
    // Use RUST_LOG=simplevb=debug for verbose output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simplevb=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                r#"{{"success":false,"error":"Failed to create runtime: {}"}}"#,
                e
            );
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async_main());

    if let Err(e) = result {
        // Errors are reported as JSON like every other response
        let response = serde_json::json!({
            "success": false,
            "error": e.to_string()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| format!(r#"{{"success":false,"error":"{}"}}"#, e))
        );
        std::process::exit(2);
    }
}

async fn async_main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app = App::new()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;
    if let Some(format) = cli.format {
        app.set_format(format);
    }

    execute_command(cli.command, &app).await
}

async fn execute_command(command: Commands, app: &App) -> anyhow::Result<()> {
    use simplevb::cli::commands;

    match command {
        // Per-file analysis
        Commands::Symbols(args) => commands::symbols::execute(args, app).await,
        Commands::Diagnostics(args) => commands::diagnostics::execute(args, app).await,

        // Navigation
        Commands::Definition(args) => commands::definition::execute(args, app).await,
        Commands::Implementations(args) => commands::implementations::execute(args, app).await,

        // Workspace
        Commands::Check(args) => commands::check::execute(args, app).await,
        Commands::Watch(args) => commands::watch::execute(args, app).await,

        Commands::Config(args) => commands::config::execute(args, app).await,
    }
}
