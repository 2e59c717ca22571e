mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use macrodash_core::Engine;
use std::process::ExitCode;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, code = error.code(), "command failed");
            if let Err(render_error) = output::render_error(&error, cli.pretty) {
                eprintln!("error: {render_error}");
            }
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let engine = Engine::from_config(&commands::engine_config(cli));
    let value = commands::run(cli, &engine).await?;
    output::render(&value, cli.pretty)?;

    // A stale read answered from the snapshot; let its refresh land on disk.
    engine.cache().wait_for_refresh().await;
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable JSON.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .init();
}
