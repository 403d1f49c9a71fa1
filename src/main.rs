//! citelegend - live citation-to-source legend for NotebookLM.
//!
//! Main entry point for the citelegend CLI.

mod cli;
mod cmd_override;
mod cmd_scan;
mod cmd_watch;
mod setup;

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

/// Get the citelegend home directory (~/.citelegend).
fn citelegend_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".citelegend"))
        .unwrap_or_else(|| PathBuf::from(".citelegend"))
}

/// Initialize tracing with console and file output.
///
/// Console output goes to stderr so that `scan --json` and `serve` keep
/// stdout clean. Log files are written to ~/.citelegend/logs/ with daily
/// rotation.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = citelegend_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("citelegend")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive for the program duration.
    static GUARD: OnceLock<WorkerGuard> = OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = setup::load_config(cli.config.as_deref())?;

    info!("citelegend v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => cmd_watch::watch(&config).await,
        Commands::Scan { json } => cmd_scan::scan(&config, json).await,
        Commands::Copy => cmd_scan::copy(&config).await,
        Commands::Transcript => cmd_scan::transcript(&config).await,
        Commands::Enhance => cmd_scan::enhance(&config),
        Commands::Override { action } => {
            cmd_override::handle_override_command(&config, action).await
        }
        Commands::Serve => cmd_watch::serve(&config).await,
    }
}
